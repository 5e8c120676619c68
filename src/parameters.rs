//! スコアリングサービスに渡すパラメータ
//!
//! `RequestParameters` は起動時に一度だけ組み立てられ、以後は読み取り専用。
//! 範囲・列挙値の妥当性はリモート側で検証されるため、ここでは型変換のみ行う。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

pub const MAX_ANOMALIES: &str = "Max anomalies to return";
pub const DIRECTION: &str = "Direction";
pub const ALPHA: &str = "Alpha";
pub const ONLY_LAST: &str = "Only Last";
pub const THRESHOLD: &str = "Threshold";
pub const EXPECTED_VALUE: &str = "Add Expected Value Column";
pub const LONGTERM: &str = "Longterm Time Series";
pub const PIECEWISE_WINDOW: &str = "Piecewise median time window";
pub const LOG_SCALING: &str = "Log Scaling";
pub const REMOVE_NAS: &str = "Remove NAs";
pub const CREATE_PLOT: &str = "Create Plot";
pub const X_LABEL: &str = "X-axis label";
pub const Y_LABEL: &str = "Y-axis label";
pub const TITLE: &str = "Title for plot";

/// サービスが要求する全キー（送信時に必ず全て含める）
pub const DISPLAY_NAMES: [&str; 14] = [
    MAX_ANOMALIES,
    DIRECTION,
    ALPHA,
    ONLY_LAST,
    THRESHOLD,
    EXPECTED_VALUE,
    LONGTERM,
    PIECEWISE_WINDOW,
    LOG_SCALING,
    REMOVE_NAS,
    CREATE_PLOT,
    X_LABEL,
    Y_LABEL,
    TITLE,
];

/// 既知の値を列挙しつつ、未知の値はそのまま転送する列挙型を定義する
macro_rules! passthrough_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// 未知の値（検証せずにそのまま送信）
            Other(String),
        }

        impl $name {
            /// ワイヤ上の文字列表現
            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $text, )+
                    $name::Other(value) => value.as_str(),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $(
                    if value.eq_ignore_ascii_case($text) {
                        return $name::$variant;
                    }
                )+
                $name::Other(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name::from(value.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name::from(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

passthrough_enum! {
    /// 検出する異常の方向
    Direction {
        Pos => "pos",
        Neg => "neg",
        Both => "both",
    }
}

passthrough_enum! {
    /// 直近の期間のみを対象にする
    OnlyLast {
        None => "None",
        Day => "day",
        Hr => "hr",
    }
}

passthrough_enum! {
    /// 日次最大値に基づく閾値フィルタ
    Threshold {
        None => "None",
        MedMax => "med_max",
        P95 => "p95",
        P99 => "p99",
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Both
    }
}

impl Default for OnlyLast {
    fn default() -> Self {
        OnlyLast::None
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::None
    }
}

/// 異常検知リクエストのパラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestParameters {
    /// 返却する異常の最大割合
    pub max_anomalies: f64,
    pub direction: Direction,
    /// 有意水準
    pub alpha: f64,
    pub only_last: OnlyLast,
    pub threshold: Threshold,
    /// 期待値列を出力に追加する
    pub expected_value: bool,
    /// 1か月を超える時系列向けのモード（未設定ならサービス既定）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longterm: Option<bool>,
    /// 区分的中央値のウィンドウ（週）
    pub piecewise_median_weeks: i64,
    /// y軸の対数スケーリング（未設定ならサービス既定）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_scaling: Option<bool>,
    pub remove_nas: bool,
    pub create_plot: bool,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self {
            max_anomalies: 0.1,
            direction: Direction::default(),
            alpha: 0.05,
            only_last: OnlyLast::default(),
            threshold: Threshold::default(),
            expected_value: false,
            longterm: None,
            piecewise_median_weeks: 2,
            log_scaling: None,
            remove_nas: false,
            create_plot: false,
            x_label: "X".to_string(),
            y_label: "Y".to_string(),
            title: "Anomalies".to_string(),
        }
    }
}

impl RequestParameters {
    /// 表示名キーから文字列値へのマップを生成
    pub fn global_parameters(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            (MAX_ANOMALIES, self.max_anomalies.to_string()),
            (DIRECTION, self.direction.to_string()),
            (ALPHA, self.alpha.to_string()),
            (ONLY_LAST, self.only_last.to_string()),
            (THRESHOLD, self.threshold.to_string()),
            (EXPECTED_VALUE, render_bool(self.expected_value)),
            (LONGTERM, render_optional_bool(self.longterm)),
            (PIECEWISE_WINDOW, self.piecewise_median_weeks.to_string()),
            (LOG_SCALING, render_optional_bool(self.log_scaling)),
            (REMOVE_NAS, render_bool(self.remove_nas)),
            (CREATE_PLOT, render_bool(self.create_plot)),
            (X_LABEL, self.x_label.clone()),
            (Y_LABEL, self.y_label.clone()),
            (TITLE, self.title.clone()),
        ])
    }
}

fn render_bool(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

// 未設定はサービス側の既定値を使わせるため空文字列を送る
fn render_optional_bool(value: Option<bool>) -> String {
    value.map(render_bool).unwrap_or_default()
}
