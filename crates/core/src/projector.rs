//! Projection of the clinically ideal scheduling date.

use crate::gestational::GaReference;
use crate::protocol::Protocol;
use chrono::NaiveDate;

/// Date on which the patient reaches the protocol's target GA.
///
/// The target is the lower bound of the protocol window. Returns `None` when the date falls
/// outside chrono's representable range.
pub fn ideal_date(reference: &GaReference, protocol: &Protocol) -> Option<NaiveDate> {
    let target_days = i64::from(protocol.target_weeks()) * 7;
    reference.date_for(target_days)
}

/// [`ideal_date`] for an optional reference; no reference means no automatic schedule.
pub fn ideal_date_for(reference: Option<&GaReference>, protocol: &Protocol) -> Option<NaiveDate> {
    reference.and_then(|r| ideal_date(r, protocol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{classify, ProtocolKey};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn dum_adds_target_weeks() {
        let reference = GaReference::dum(ymd(2025, 1, 1));
        let protocol = ProtocolKey::DmgSemInsulina.protocol();
        // 39 weeks = 273 days.
        assert_eq!(ideal_date(&reference, protocol), Some(ymd(2025, 10, 1)));
    }

    #[test]
    fn ultrasound_subtracts_reported_ga() {
        let reference = GaReference::ultrasound(ymd(2025, 3, 10), 12, 3).expect("valid");
        let protocol = ProtocolKey::Hipertensao.protocol();
        // 37*7 - (12*7 + 3) = 172 days after the exam.
        assert_eq!(ideal_date(&reference, protocol), Some(ymd(2025, 8, 29)));
    }

    #[test]
    fn ranged_protocol_uses_lower_bound() {
        let reference = GaReference::dum(ymd(2025, 1, 1));
        let protocol = classify("IIC, cerclagem prévia", "", "");
        assert_eq!(protocol.key, ProtocolKey::Cerclagem);
        assert_eq!(ideal_date(&reference, protocol), Some(ymd(2025, 4, 2)));
    }

    #[test]
    fn ultrasound_past_target_projects_backwards() {
        let reference = GaReference::ultrasound(ymd(2025, 3, 10), 20, 0).expect("valid");
        let protocol = ProtocolKey::Cerclagem.protocol();
        assert_eq!(ideal_date(&reference, protocol), Some(ymd(2025, 1, 20)));
    }

    #[test]
    fn missing_reference_has_no_date() {
        assert_eq!(ideal_date_for(None, ProtocolKey::BaixoRisco.protocol()), None);
    }
}
