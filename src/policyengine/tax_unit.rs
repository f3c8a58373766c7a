//! Tax unit classification.
//!
//! Every member lands in exactly one of: the main tax unit, the secondary tax
//! unit, or neither.
//!
//! - The head and the head's spouse or partner file the main return.
//! - Qualifying children and qualifying relatives are main dependents.
//! - Of everyone left, the oldest member who can file alone heads the
//!   secondary return and the rest of the leftovers are its dependents.
//! - With nobody left who can file, leftovers belong to neither unit.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{Household, HouseholdMember, IncomeFilter, MemberId, Timeframe};

/// Gross income ceiling for the qualifying-relative test.
pub const QUALIFYING_RELATIVE_INCOME_LIMIT: i64 = 5_050;

/// Which return a member is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaxUnitId {
    /// The head's return.
    Main,
    /// A second return for other adults in the home.
    Secondary,
}

impl TaxUnitId {
    /// Key of the unit in the PolicyEngine document.
    pub fn key(self) -> &'static str {
        match self {
            TaxUnitId::Main => "tax_unit",
            TaxUnitId::Secondary => "secondary_tax_unit",
        }
    }
}

/// A member's role on their return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxRole {
    /// Primary filer.
    Head,
    /// Joint filer.
    Spouse,
    /// Claimed dependent.
    Dependent,
}

/// Where one member files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxAssignment {
    /// The return.
    pub unit: TaxUnitId,
    /// The member's role on it.
    pub role: TaxRole,
}

/// Tax unit assignments for a whole household.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxUnitStructure {
    assignments: BTreeMap<MemberId, TaxAssignment>,
    order: Vec<MemberId>,
}

fn is_qualifying_child(member: &HouseholdMember) -> bool {
    if !member.relationship.is_child_like() {
        return false;
    }
    match member.age {
        Some(age) => age < 19 || (member.student && age < 24) || member.has_disability(),
        None => false,
    }
}

fn is_qualifying_relative(member: &HouseholdMember) -> bool {
    let related = member.relationship.is_qualifying_relative() || member.relationship.is_child_like();
    let income = member.calc_gross_income(Timeframe::Yearly, &[IncomeFilter::All], &[]);
    related && income < Decimal::from(QUALIFYING_RELATIVE_INCOME_LIMIT)
}

fn can_file_alone(member: &HouseholdMember) -> bool {
    match member.age {
        Some(age) => age >= 18,
        None => !member.relationship.is_child_like(),
    }
}

impl TaxUnitStructure {
    /// Classifies every member of `household`.
    pub fn classify(household: &Household) -> Self {
        let mut structure = Self {
            assignments: BTreeMap::new(),
            order: household.members.iter().map(|m| m.id).collect(),
        };

        let head = household.head();
        if let Some(head) = head {
            structure.assign(head.id, TaxUnitId::Main, TaxRole::Head);
            if let Some(spouse) = household.spouse() {
                structure.assign(spouse.id, TaxUnitId::Main, TaxRole::Spouse);
            }
            for member in &household.members {
                if structure.assignments.contains_key(&member.id) {
                    continue;
                }
                if is_qualifying_child(member) || is_qualifying_relative(member) {
                    structure.assign(member.id, TaxUnitId::Main, TaxRole::Dependent);
                }
            }
        }

        let remaining: Vec<&HouseholdMember> = household
            .members
            .iter()
            .filter(|m| !structure.assignments.contains_key(&m.id))
            .collect();

        let secondary_head = remaining
            .iter()
            .filter(|m| can_file_alone(m))
            .fold(None::<&HouseholdMember>, |oldest, m| match oldest {
                Some(o) if o.age >= m.age => Some(o),
                _ => Some(*m),
            });

        if let Some(secondary_head) = secondary_head {
            structure.assign(secondary_head.id, TaxUnitId::Secondary, TaxRole::Head);
            for member in remaining {
                if member.id != secondary_head.id {
                    structure.assign(member.id, TaxUnitId::Secondary, TaxRole::Dependent);
                }
            }
        }

        structure
    }

    fn assign(&mut self, id: MemberId, unit: TaxUnitId, role: TaxRole) {
        self.assignments.insert(id, TaxAssignment { unit, role });
    }

    /// Where `id` files, if anywhere.
    pub fn assignment(&self, id: MemberId) -> Option<TaxAssignment> {
        self.assignments.get(&id).copied()
    }

    /// Members of `unit`, in household order.
    pub fn members_of(&self, unit: TaxUnitId) -> Vec<MemberId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.assignment(*id).is_some_and(|a| a.unit == unit))
            .collect()
    }

    /// Units with at least one member, main first.
    pub fn units(&self) -> Vec<TaxUnitId> {
        [TaxUnitId::Main, TaxUnitId::Secondary]
            .into_iter()
            .filter(|unit| !self.members_of(*unit).is_empty())
            .collect()
    }

    /// True if `id` has `role` on any return.
    pub fn has_role(&self, id: MemberId, role: TaxRole) -> bool {
        self.assignment(id).is_some_and(|a| a.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, IncomeStream, IncomeType, Relationship};

    fn member(id: u32, relationship: Relationship, age: Option<u32>) -> HouseholdMember {
        HouseholdMember::new(MemberId(id), relationship, age)
    }

    fn household(members: Vec<HouseholdMember>) -> Household {
        let mut household = Household::new("IL");
        household.members = members;
        household
    }

    #[test]
    fn test_married_couple_with_child_share_main_unit() {
        let h = household(vec![
            member(1, Relationship::HeadOfHousehold, Some(40)),
            member(2, Relationship::Spouse, Some(38)),
            member(3, Relationship::Child, Some(10)),
        ]);
        let structure = TaxUnitStructure::classify(&h);

        assert_eq!(
            structure.members_of(TaxUnitId::Main),
            vec![MemberId(1), MemberId(2), MemberId(3)]
        );
        assert!(structure.has_role(MemberId(2), TaxRole::Spouse));
        assert!(structure.has_role(MemberId(3), TaxRole::Dependent));
        assert_eq!(structure.units(), vec![TaxUnitId::Main]);
    }

    #[test]
    fn test_student_under_24_is_dependent() {
        let mut student = member(2, Relationship::Child, Some(22));
        student.student = true;
        student.income_streams.push(IncomeStream {
            income_type: IncomeType::Wages,
            amount: Decimal::from(1_000),
            frequency: Frequency::Monthly,
            hours_worked: None,
        });
        let h = household(vec![member(1, Relationship::HeadOfHousehold, Some(50)), student]);

        let structure = TaxUnitStructure::classify(&h);
        assert!(structure.has_role(MemberId(2), TaxRole::Dependent));
    }

    #[test]
    fn test_low_income_parent_is_qualifying_relative() {
        let h = household(vec![
            member(1, Relationship::HeadOfHousehold, Some(45)),
            member(2, Relationship::Parent, Some(75)),
        ]);
        let structure = TaxUnitStructure::classify(&h);
        assert_eq!(
            structure.assignment(MemberId(2)),
            Some(TaxAssignment {
                unit: TaxUnitId::Main,
                role: TaxRole::Dependent,
            })
        );
    }

    #[test]
    fn test_roommates_form_secondary_unit_headed_by_oldest() {
        let mut younger = member(2, Relationship::Roommate, Some(29));
        younger.income_streams.push(IncomeStream {
            income_type: IncomeType::Wages,
            amount: Decimal::from(3_000),
            frequency: Frequency::Monthly,
            hours_worked: None,
        });
        let h = household(vec![
            member(1, Relationship::HeadOfHousehold, Some(30)),
            younger,
            member(3, Relationship::Roommate, Some(41)),
        ]);
        let structure = TaxUnitStructure::classify(&h);

        assert!(structure.has_role(MemberId(3), TaxRole::Head));
        assert_eq!(
            structure.members_of(TaxUnitId::Secondary),
            vec![MemberId(2), MemberId(3)]
        );
        assert_eq!(structure.units(), vec![TaxUnitId::Main, TaxUnitId::Secondary]);
    }

    #[test]
    fn test_leftover_minor_without_adult_is_in_neither_unit() {
        let mut older_child = member(2, Relationship::Other, Some(16));
        older_child.income_streams.push(IncomeStream {
            income_type: IncomeType::Wages,
            amount: Decimal::from(800),
            frequency: Frequency::Monthly,
            hours_worked: None,
        });
        let h = household(vec![member(1, Relationship::HeadOfHousehold, Some(30)), older_child]);
        let structure = TaxUnitStructure::classify(&h);

        assert_eq!(structure.assignment(MemberId(2)), None);
        assert_eq!(structure.units(), vec![TaxUnitId::Main]);
    }
}
