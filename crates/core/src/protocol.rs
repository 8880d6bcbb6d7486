//! Obstetric protocols and diagnosis classification.
//!
//! Each [`Protocol`] maps a diagnosis category to an ideal delivery window in weeks. The
//! registry is static; classification walks an ordered list of keyword rules and returns
//! the protocol of the first rule that matches, so a record that fits several categories is
//! always placed under the highest-acuity one.
//!
//! Matching is plain substring search over the lower-cased concatenation of the diagnosis,
//! medication and procedure text.

use crate::error::{ScheduleError, ScheduleResult};
use serde::Serialize;

/// Identifier of a protocol in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKey {
    Cerclagem,
    GemelarMonocorionico,
    Gemelar,
    DmgInsulina,
    Hipertensao,
    Rcf,
    Macrossomia,
    ApresentacaoAnomala,
    DmgSemInsulina,
    BaixoRisco,
}

impl ProtocolKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolKey::Cerclagem => "cerclagem",
            ProtocolKey::GemelarMonocorionico => "gemelar_monocorionico",
            ProtocolKey::Gemelar => "gemelar",
            ProtocolKey::DmgInsulina => "dmg_insulina",
            ProtocolKey::Hipertensao => "hipertensao",
            ProtocolKey::Rcf => "rcf",
            ProtocolKey::Macrossomia => "macrossomia",
            ProtocolKey::ApresentacaoAnomala => "apresentacao_anomala",
            ProtocolKey::DmgSemInsulina => "dmg_sem_insulina",
            ProtocolKey::BaixoRisco => "baixo_risco",
        }
    }

    /// The registry entry for this key.
    pub fn protocol(self) -> &'static Protocol {
        match self {
            ProtocolKey::Cerclagem => &PROTOCOLS[0],
            ProtocolKey::GemelarMonocorionico => &PROTOCOLS[1],
            ProtocolKey::Gemelar => &PROTOCOLS[2],
            ProtocolKey::DmgInsulina => &PROTOCOLS[3],
            ProtocolKey::Hipertensao => &PROTOCOLS[4],
            ProtocolKey::Rcf => &PROTOCOLS[5],
            ProtocolKey::Macrossomia => &PROTOCOLS[6],
            ProtocolKey::ApresentacaoAnomala => &PROTOCOLS[7],
            ProtocolKey::DmgSemInsulina => &PROTOCOLS[8],
            ProtocolKey::BaixoRisco => &PROTOCOLS[9],
        }
    }
}

impl std::fmt::Display for ProtocolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clinical protocol with its ideal delivery window.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Protocol {
    pub key: ProtocolKey,
    pub display_name: &'static str,
    pub ideal_ga_min_weeks: u32,
    pub ideal_ga_max_weeks: u32,
    pub is_urgent: bool,
}

impl Protocol {
    /// The actionable target: the lower bound of the window.
    pub fn target_weeks(&self) -> u32 {
        self.ideal_ga_min_weeks
    }

    /// Whether `weeks` lies inside the ideal window.
    pub fn window_contains(&self, weeks: u32) -> bool {
        (self.ideal_ga_min_weeks..=self.ideal_ga_max_weeks).contains(&weeks)
    }

    /// The window written as `"37s"` or `"13-15s"`.
    pub fn window_label(&self) -> String {
        if self.ideal_ga_min_weeks == self.ideal_ga_max_weeks {
            format!("{}s", self.ideal_ga_min_weeks)
        } else {
            format!("{}-{}s", self.ideal_ga_min_weeks, self.ideal_ga_max_weeks)
        }
    }
}

const fn protocol(
    key: ProtocolKey,
    display_name: &'static str,
    min: u32,
    max: u32,
    is_urgent: bool,
) -> Protocol {
    Protocol {
        key,
        display_name,
        ideal_ga_min_weeks: min,
        ideal_ga_max_weeks: max,
        is_urgent,
    }
}

/// Protocol registry, in the same order as [`ProtocolKey`].
pub static PROTOCOLS: [Protocol; 10] = [
    protocol(ProtocolKey::Cerclagem, "Cerclagem / IIC", 13, 15, true),
    protocol(ProtocolKey::GemelarMonocorionico, "Gemelar monocoriônico", 32, 34, false),
    protocol(ProtocolKey::Gemelar, "Gemelar", 36, 37, false),
    protocol(ProtocolKey::DmgInsulina, "Diabetes com insulina", 38, 38, false),
    protocol(ProtocolKey::Hipertensao, "Hipertensão / pré-eclâmpsia", 37, 37, false),
    protocol(ProtocolKey::Rcf, "Restrição de crescimento fetal", 37, 37, false),
    protocol(ProtocolKey::Macrossomia, "Macrossomia / GIG", 39, 39, false),
    protocol(ProtocolKey::ApresentacaoAnomala, "Pélvico / córmico", 38, 38, false),
    protocol(ProtocolKey::DmgSemInsulina, "Diabetes sem insulina", 39, 39, false),
    protocol(ProtocolKey::BaixoRisco, "Baixo risco", 39, 40, false),
];

const CERCLAGE: &[&str] = &[
    "cerclage",
    "cerclagem",
    "iic",
    "istmo",
    "incompetência",
    "incompetencia",
];
const MULTIPLE: &[&str] = &["gemelar", "gêmeo", "gemeo"];
const MONOCHORIONIC: &[&str] = &["mono"];
const DIABETES: &[&str] = &["dmg", "dm2", "diabet"];
const INSULIN: &[&str] = &["insulina", "nph"];
const HYPERTENSION: &[&str] = &["hac", "hipertens", "dheg", "eclâmpsia", "eclampsia"];
const GROWTH_RESTRICTION: &[&str] = &["rcf", "rciu", "restriç", "restric", "pig"];
const MACROSOMIA: &[&str] = &["gig", "macrossom", "p>90", "p90"];
const MALPRESENTATION: &[&str] = &["pélv", "pelv", "córm", "corm", "transvers"];

/// A classification rule: every keyword group must have at least one hit.
struct Rule {
    protocol: ProtocolKey,
    all_of: &'static [&'static [&'static str]],
}

/// Rules from highest to lowest acuity. The first match wins.
const RULES: &[Rule] = &[
    Rule {
        protocol: ProtocolKey::Cerclagem,
        all_of: &[CERCLAGE],
    },
    Rule {
        protocol: ProtocolKey::GemelarMonocorionico,
        all_of: &[MULTIPLE, MONOCHORIONIC],
    },
    Rule {
        protocol: ProtocolKey::Gemelar,
        all_of: &[MULTIPLE],
    },
    Rule {
        protocol: ProtocolKey::DmgInsulina,
        all_of: &[DIABETES, INSULIN],
    },
    Rule {
        protocol: ProtocolKey::Hipertensao,
        all_of: &[HYPERTENSION],
    },
    Rule {
        protocol: ProtocolKey::Rcf,
        all_of: &[GROWTH_RESTRICTION],
    },
    Rule {
        protocol: ProtocolKey::Macrossomia,
        all_of: &[MACROSOMIA],
    },
    Rule {
        protocol: ProtocolKey::ApresentacaoAnomala,
        all_of: &[MALPRESENTATION],
    },
    Rule {
        protocol: ProtocolKey::DmgSemInsulina,
        all_of: &[DIABETES],
    },
];

impl Rule {
    fn matches(&self, text: &str) -> bool {
        self.all_of
            .iter()
            .all(|group| group.iter().any(|keyword| text.contains(keyword)))
    }
}

/// Classifies a patient's free text into exactly one protocol.
///
/// Falls back to [`ProtocolKey::BaixoRisco`] when no rule matches.
pub fn classify(diagnosis: &str, medication: &str, procedure: &str) -> &'static Protocol {
    let text = format!("{diagnosis} {medication} {procedure}").to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&text))
        .map(|rule| rule.protocol)
        .unwrap_or(ProtocolKey::BaixoRisco)
        .protocol()
}

/// Parses an ideal-GA label such as `"39"`, `"39s"` or `"13-15s"` into `(min, max)` weeks.
pub fn parse_ga_window(label: &str) -> ScheduleResult<(u32, u32)> {
    let fail = || ScheduleError::GaParse(label.to_string());
    let trimmed = label.trim().trim_end_matches(['s', 'S']).trim();

    let number = |s: &str| -> ScheduleResult<u32> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(fail());
        }
        s.parse::<u32>().map_err(|_| fail())
    };

    match trimmed.split_once('-') {
        Some((lo, hi)) => {
            let (lo, hi) = (number(lo)?, number(hi)?);
            if lo > hi {
                return Err(fail());
            }
            Ok((lo, hi))
        }
        None => {
            let weeks = number(trimmed)?;
            Ok((weeks, weeks))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_order_matches_keys() {
        for entry in PROTOCOLS.iter() {
            assert_eq!(entry.key.protocol(), entry);
            assert!(entry.ideal_ga_min_weeks <= entry.ideal_ga_max_weeks);
        }
    }

    #[test]
    fn defaults_to_low_risk() {
        let p = classify("Gestação sem intercorrências", "", "Cesárea eletiva");
        assert_eq!(p.key, ProtocolKey::BaixoRisco);
        assert_eq!((p.ideal_ga_min_weeks, p.ideal_ga_max_weeks), (39, 40));
    }

    #[test]
    fn multiple_gestation_outranks_diabetes() {
        let p = classify("Gemelar, DMG", "", "");
        assert_eq!(p.key, ProtocolKey::Gemelar);
    }

    #[test]
    fn monochorionic_twins_split() {
        assert_eq!(
            classify("Gestação gemelar monocoriônica", "", "").key,
            ProtocolKey::GemelarMonocorionico
        );
        assert_eq!(
            classify("Gemelar dicoriônica diamniótica", "", "").key,
            ProtocolKey::Gemelar
        );
    }

    #[test]
    fn cerclage_is_urgent_and_wins() {
        let p = classify("HAC", "", "Cerclagem");
        assert_eq!(p.key, ProtocolKey::Cerclagem);
        assert!(p.is_urgent);
        assert_eq!(p.target_weeks(), 13);
    }

    #[test]
    fn diabetes_split_on_insulin_from_medication() {
        assert_eq!(
            classify("DMG", "Insulina NPH 10UI", "").key,
            ProtocolKey::DmgInsulina
        );
        assert_eq!(classify("DMG A1", "Metformina", "").key, ProtocolKey::DmgSemInsulina);
    }

    #[test]
    fn precedence_below_diabetes_with_insulin() {
        assert_eq!(classify("DHEG + feto PIG", "", "").key, ProtocolKey::Hipertensao);
        assert_eq!(classify("RCIU, feto GIG?", "", "").key, ProtocolKey::Rcf);
        assert_eq!(classify("Feto GIG, pélvico", "", "").key, ProtocolKey::Macrossomia);
        assert_eq!(classify("Apresentação pélvica, DMG", "", "").key, ProtocolKey::ApresentacaoAnomala);
        assert_eq!(classify("situação transversa", "", "").key, ProtocolKey::ApresentacaoAnomala);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("PRÉ-ECLÂMPSIA", "", "").key, ProtocolKey::Hipertensao);
    }

    #[test]
    fn window_helpers() {
        let cerclage = ProtocolKey::Cerclagem.protocol();
        assert_eq!(cerclage.window_label(), "13-15s");
        assert!(cerclage.window_contains(14));
        assert!(!cerclage.window_contains(16));
        assert_eq!(ProtocolKey::Rcf.protocol().window_label(), "37s");
    }

    #[test]
    fn parses_window_labels() {
        assert_eq!(parse_ga_window("13-15").expect("range"), (13, 15));
        assert_eq!(parse_ga_window("39s").expect("single"), (39, 39));
        assert_eq!(parse_ga_window(" 34 - 36s ").expect("spaced"), (34, 36));
        assert!(matches!(parse_ga_window("Imediato"), Err(ScheduleError::GaParse(_))));
        assert!(matches!(parse_ga_window("15-13"), Err(ScheduleError::GaParse(_))));
    }
}
