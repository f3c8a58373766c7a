//! Builds a [`HouseholdDocument`] from a household and the active
//! calculators' variable specs.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::debug;

use super::document::{GroupUnit, HouseholdDocument, reserve_field, write_field};
use super::tax_unit::TaxUnitStructure;
use super::variables::{InputContext, PeInput, PeOutput, PeUnit, PolicyEngineSpec};
use crate::error::EngineResult;
use crate::models::Household;

/// Key of the single family.
pub const FAMILY_KEY: &str = "family";
/// Key of the single household unit.
pub const HOUSEHOLD_KEY: &str = "household";
/// Key of the single SPM unit.
pub const SPM_UNIT_KEY: &str = "spm_unit";

/// Builds the document for `household`.
///
/// Inputs declared by several specs are computed and written once. Outputs
/// become `null` slots. A household with no members yields empty containers.
///
/// # Example
///
/// ```
/// use benefits_engine::models::{Household, HouseholdMember, MemberId, Relationship};
/// use benefits_engine::policyengine::{PeInput, PeOutput, PolicyEngineSpec, build_document};
///
/// let mut household = Household::new("IL");
/// household.members.push(HouseholdMember::new(MemberId(1), Relationship::HeadOfHousehold, Some(30)));
/// let spec = PolicyEngineSpec::new(&[PeInput::Age], &[PeOutput::Medicaid]);
///
/// let doc = build_document(&household, &[&spec], "2025")?;
/// assert_eq!(doc.people["1"]["age"]["2025"], 30);
/// assert!(doc.people["1"]["medicaid"]["2025"].is_null());
/// assert_eq!(doc.marital_units["1"].members, vec!["1"]);
/// # Ok::<(), benefits_engine::error::EngineError>(())
/// ```
pub fn build_document(
    household: &Household,
    specs: &[&PolicyEngineSpec],
    period: &str,
) -> EngineResult<HouseholdDocument> {
    let tax_units = TaxUnitStructure::classify(household);
    let mut doc = HouseholdDocument::default();

    for member in &household.members {
        doc.people.insert(member.id.to_string(), Default::default());
    }

    if !household.members.is_empty() {
        let everyone: Vec<String> = household.members.iter().map(|m| m.id.to_string()).collect();
        doc.families
            .insert(FAMILY_KEY.to_string(), GroupUnit::with_members(everyone.clone()));
        doc.households
            .insert(HOUSEHOLD_KEY.to_string(), GroupUnit::with_members(everyone.clone()));
        doc.spm_units
            .insert(SPM_UNIT_KEY.to_string(), GroupUnit::with_members(everyone));
    }

    for unit in tax_units.units() {
        let members = tax_units.members_of(unit).iter().map(ToString::to_string).collect();
        doc.tax_units
            .insert(unit.key().to_string(), GroupUnit::with_members(members));
    }

    insert_marital_units(household, &mut doc);

    let inputs: BTreeSet<PeInput> = specs.iter().flat_map(|s| s.inputs.iter().copied()).collect();
    let outputs: BTreeSet<PeOutput> = specs.iter().flat_map(|s| s.outputs.iter().copied()).collect();

    let ctx = InputContext {
        household,
        tax_units: &tax_units,
    };

    for input in &inputs {
        let field = input.field();
        match input.unit() {
            PeUnit::Person => {
                for member in &household.members {
                    let id = member.id.to_string();
                    let value = Value::from(input.value(&ctx, Some(member)));
                    if let Some(fields) = doc.people.get_mut(&id) {
                        write_field(fields, "people", &id, field, period, value)?;
                    }
                }
            }
            unit => {
                let value = Value::from(input.value(&ctx, None));
                for (category, key, group) in groups_mut(&mut doc, unit) {
                    write_field(&mut group.fields, category, &key, field, period, value.clone())?;
                }
            }
        }
    }

    for output in &outputs {
        match output.unit() {
            PeUnit::Person => {
                for fields in doc.people.values_mut() {
                    reserve_field(fields, output.field(), period);
                }
            }
            unit => {
                for (_, _, group) in groups_mut(&mut doc, unit) {
                    reserve_field(&mut group.fields, output.field(), period);
                }
            }
        }
    }

    debug!(
        members = household.members.len(),
        tax_units = doc.tax_units.len(),
        inputs = inputs.len(),
        outputs = outputs.len(),
        "Built PolicyEngine household"
    );

    Ok(doc)
}

/// Head and spouse share one unit keyed `"a-b"`; everyone else is alone.
fn insert_marital_units(household: &Household, doc: &mut HouseholdDocument) {
    let couple = household
        .head()
        .zip(household.spouse())
        .map(|(head, spouse)| (head.id.min(spouse.id), head.id.max(spouse.id)));

    if let Some((a, b)) = couple {
        doc.marital_units.insert(
            format!("{a}-{b}"),
            GroupUnit::with_members(vec![a.to_string(), b.to_string()]),
        );
    }

    for member in &household.members {
        let paired = couple.is_some_and(|(a, b)| member.id == a || member.id == b);
        if !paired {
            let id = member.id.to_string();
            doc.marital_units
                .insert(id.clone(), GroupUnit::with_members(vec![id]));
        }
    }
}

fn groups_mut(
    doc: &mut HouseholdDocument,
    unit: PeUnit,
) -> impl Iterator<Item = (&'static str, String, &mut GroupUnit)> {
    let (category, groups) = match unit {
        PeUnit::TaxUnit => ("tax_units", &mut doc.tax_units),
        PeUnit::SpmUnit => ("spm_units", &mut doc.spm_units),
        PeUnit::Household | PeUnit::Person => ("households", &mut doc.households),
    };
    groups
        .iter_mut()
        .map(move |(key, group)| (category, key.clone(), group))
}
