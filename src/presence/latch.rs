use serde::{Deserialize, Serialize};

/// Edge-trigger guard for one alert condition. An armed latch fires once and then
/// stays fired until the condition clears and it is re-armed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AlertLatch {
    #[default]
    Armed,
    Fired,
}

impl AlertLatch {
    /// Returns `true` only on the `Armed -> Fired` edge.
    pub fn try_fire(&mut self) -> bool {
        match self {
            AlertLatch::Armed => {
                *self = AlertLatch::Fired;
                true
            }
            AlertLatch::Fired => false,
        }
    }

    pub fn rearm(&mut self) {
        *self = AlertLatch::Armed;
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, AlertLatch::Armed)
    }
}
