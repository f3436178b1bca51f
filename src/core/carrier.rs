/*!
 * Two-tier carrier classification
 *
 * Tier one asks a [`NumberingPlan`] for validity, line type and operator
 * name. Tier two is a digit heuristic used only when tier one has no
 * answer for a mobile number (no plan configured, or no operator name).
 */

use std::fmt;
use std::sync::Arc;

use super::phone::{NormalizedPhone, MIN_NORMALIZED_LEN};

/// Carrier attributed to a phone number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CarrierLabel {
    Claro,
    Vivo,
    Tim,
    Oi,
    /// Landline, regardless of operator
    Fixo,
    /// Operator name outside the four majors, letters only
    Other(String),
    /// Not enough data to attribute a carrier
    NoCarrier,
}

impl fmt::Display for CarrierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierLabel::Claro => write!(f, "CLARO"),
            CarrierLabel::Vivo => write!(f, "VIVO"),
            CarrierLabel::Tim => write!(f, "TIM"),
            CarrierLabel::Oi => write!(f, "OI"),
            CarrierLabel::Fixo => write!(f, "FIXO"),
            CarrierLabel::Other(name) => write!(f, "{}", name),
            CarrierLabel::NoCarrier => write!(f, "SEM OPERADORA"),
        }
    }
}

/// Line type reported by a numbering plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    FixedLine,
    Mobile,
    FixedLineOrMobile,
    Other,
}

/// Result of an operator-name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarrierLookup {
    Found(String),
    /// Lookup ran but knows no operator for the number
    Unknown,
    /// No operator data is loaded
    Unavailable,
}

/// National number as understood by a numbering plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNumber {
    pub area_code: String,
    pub subscriber: String,
}

impl PlanNumber {
    /// Area code followed by subscriber digits
    pub fn national(&self) -> String {
        format!("{}{}", self.area_code, self.subscriber)
    }
}

/// Authoritative phone-numbering capability for region BR
pub trait NumberingPlan: Send + Sync {
    /// Parse a normalized number; `None` when it cannot be parsed
    fn parse(&self, phone: &NormalizedPhone) -> Option<PlanNumber>;

    fn is_valid(&self, number: &PlanNumber) -> bool;

    fn line_type(&self, number: &PlanNumber) -> LineType;

    fn carrier_name(&self, number: &PlanNumber) -> CarrierLookup;
}

/// Map an operator name to a label: CLARO, VIVO, TIM, OI by substring in
/// that priority, otherwise the name with everything but A-Z removed.
pub fn label_from_carrier_name(name: &str) -> Option<CarrierLabel> {
    let upper = name.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    let label = if upper.contains("CLARO") {
        CarrierLabel::Claro
    } else if upper.contains("VIVO") {
        CarrierLabel::Vivo
    } else if upper.contains("TIM") {
        CarrierLabel::Tim
    } else if upper.contains("OI") {
        CarrierLabel::Oi
    } else {
        let letters: String = upper.chars().filter(|c| c.is_ascii_uppercase()).collect();
        if letters.is_empty() {
            CarrierLabel::NoCarrier
        } else {
            CarrierLabel::Other(letters)
        }
    };

    Some(label)
}

/// Best-effort guess from the digit after the area code.
///
/// Based on stale numbering-plan ranges and known to be imprecise: for a
/// 13-digit mobile number index 4 is the leading `9` itself, so most
/// mobiles land on VIVO. Only used when no authoritative answer exists.
pub fn classify_heuristic(phone: &NormalizedPhone) -> CarrierLabel {
    if phone.len() != 13 {
        return CarrierLabel::NoCarrier;
    }

    match phone.as_str().as_bytes()[4] {
        b'6' | b'7' => CarrierLabel::Claro,
        b'9' => CarrierLabel::Vivo,
        b'8' => CarrierLabel::Tim,
        b'3' => CarrierLabel::Oi,
        _ => CarrierLabel::NoCarrier,
    }
}

/// Classifier combining an optional numbering plan with the heuristic
#[derive(Clone, Default)]
pub struct CarrierClassifier {
    plan: Option<Arc<dyn NumberingPlan>>,
}

impl CarrierClassifier {
    pub fn new(plan: Option<Arc<dyn NumberingPlan>>) -> Self {
        Self { plan }
    }

    /// Classifier without authoritative data; every lookup uses the heuristic
    pub fn heuristic_only() -> Self {
        Self { plan: None }
    }

    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    /// Classify a normalized number into a carrier label
    pub fn classify(&self, phone: &NormalizedPhone) -> CarrierLabel {
        if phone.is_empty() || phone.len() < MIN_NORMALIZED_LEN {
            return CarrierLabel::NoCarrier;
        }

        self.classify_authoritative(phone)
            .unwrap_or_else(|| classify_heuristic(phone))
    }

    /// Authoritative tier. `None` means the plan could not name an operator
    /// for a mobile number (or no plan is configured) and the caller should
    /// fall back to the heuristic.
    pub fn classify_authoritative(&self, phone: &NormalizedPhone) -> Option<CarrierLabel> {
        let plan = self.plan.as_ref()?;

        let Some(number) = plan.parse(phone) else {
            return Some(CarrierLabel::NoCarrier);
        };
        if !plan.is_valid(&number) {
            return Some(CarrierLabel::NoCarrier);
        }

        match plan.line_type(&number) {
            LineType::FixedLine => Some(CarrierLabel::Fixo),
            LineType::Mobile | LineType::FixedLineOrMobile => match plan.carrier_name(&number) {
                CarrierLookup::Found(name) => label_from_carrier_name(&name),
                CarrierLookup::Unknown | CarrierLookup::Unavailable => None,
            },
            LineType::Other => Some(CarrierLabel::NoCarrier),
        }
    }
}

impl fmt::Debug for CarrierClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierClassifier")
            .field("has_plan", &self.has_plan())
            .finish()
    }
}
