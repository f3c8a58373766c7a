//! The closed table of program codes and their calculators.

use super::calculator::ProgramCalculator;
use super::programs::{co, federal, il, ma, nc};
use crate::error::{EngineError, EngineResult};

type Constructor = fn() -> Box<dyn ProgramCalculator>;

fn boxed<C: ProgramCalculator + Default + 'static>() -> Box<dyn ProgramCalculator> {
    Box::new(C::default())
}

const REGISTRY: &[(&str, Constructor)] = &[
    ("medicaid", boxed::<federal::Medicaid>),
    ("wic", boxed::<federal::Wic>),
    ("snap", boxed::<federal::Snap>),
    ("aca", boxed::<federal::Aca>),
    ("medicare_savings", boxed::<federal::MedicareSavings>),
    ("il_all_kids", boxed::<il::AllKids>),
    ("il_family_care", boxed::<il::FamilyCare>),
    ("il_moms_and_babies", boxed::<il::MomsAndBabies>),
    ("il_ccap", boxed::<il::Ccap>),
    ("il_hbwd", boxed::<il::Hbwd>),
    ("co_nurse_family_partnership", boxed::<co::NurseFamilyPartnership>),
    ("co_weatherization_assistance", boxed::<co::Weatherization>),
    ("nc_lieap", boxed::<nc::Lieap>),
    ("ma_middle_income_rental", boxed::<ma::MiddleIncomeRental>),
    ("ma_cha", boxed::<ma::Cha>),
];

/// Builds the calculator registered for `code`.
///
/// # Example
///
/// ```
/// use benefits_engine::calculation::calculator_for;
///
/// assert!(calculator_for("snap").is_ok());
/// assert!(calculator_for("tx_unknown").is_err());
/// ```
pub fn calculator_for(code: &str) -> EngineResult<Box<dyn ProgramCalculator>> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == code)
        .map(|(_, build)| build())
        .ok_or_else(|| EngineError::UnknownProgram {
            code: code.to_string(),
        })
}

/// Every registered code, in registration order.
pub fn registered_codes() -> Vec<&'static str> {
    REGISTRY.iter().map(|(code, _)| *code).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_codes_are_unique() {
        let codes = registered_codes();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        match calculator_for("tx_snap") {
            Err(EngineError::UnknownProgram { code }) => assert_eq!(code, "tx_snap"),
            Err(other) => panic!("Expected UnknownProgram, got {:?}", other),
            Ok(_) => panic!("Expected UnknownProgram"),
        }
    }

    #[test]
    fn test_policyengine_programs_declare_variables() {
        for code in ["medicaid", "wic", "snap", "aca", "il_hbwd"] {
            let calc = calculator_for(code).unwrap();
            assert!(calc.policy_engine().is_some(), "{code} should use PolicyEngine");
        }
        assert!(calculator_for("nc_lieap").unwrap().policy_engine().is_none());
    }

    #[test]
    fn test_references_are_registered() {
        let codes = registered_codes();
        for code in &codes {
            for reference in calculator_for(code).unwrap().references() {
                assert!(codes.contains(reference), "{code} references {reference}");
            }
        }
    }
}
