use std::fmt;

use rumqttc::QoS;

/// Delivery guarantee requested from the broker for one subscription.
///
/// The broker enforces it; the dispatcher only passes it along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeliveryQuality {
    /// QoS 0.
    AtMostOnce,
    /// QoS 1.
    AtLeastOnce,
    /// QoS 2.
    ExactlyOnce,
}

impl DeliveryQuality {
    /// Map a raw QoS level. Anything above 2 is not a valid level.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(DeliveryQuality::AtMostOnce),
            1 => Some(DeliveryQuality::AtLeastOnce),
            2 => Some(DeliveryQuality::ExactlyOnce),
            _ => None,
        }
    }

    /// Resolve an entry's optional hint against the process-wide default.
    ///
    /// A missing or out-of-range hint yields `default`.
    pub fn resolve(hint: Option<u8>, default: DeliveryQuality) -> Self {
        hint.and_then(Self::from_level).unwrap_or(default)
    }

    pub fn level(self) -> u8 {
        match self {
            DeliveryQuality::AtMostOnce => 0,
            DeliveryQuality::AtLeastOnce => 1,
            DeliveryQuality::ExactlyOnce => 2,
        }
    }
}

impl Default for DeliveryQuality {
    fn default() -> Self {
        DeliveryQuality::ExactlyOnce
    }
}

impl fmt::Display for DeliveryQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qos{}", self.level())
    }
}

impl From<DeliveryQuality> for QoS {
    fn from(q: DeliveryQuality) -> Self {
        match q {
            DeliveryQuality::AtMostOnce => QoS::AtMostOnce,
            DeliveryQuality::AtLeastOnce => QoS::AtLeastOnce,
            DeliveryQuality::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}
