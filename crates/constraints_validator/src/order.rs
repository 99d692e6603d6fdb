//! Validation order.
//!
//! Requested groups are split into plain groups, validated together and
//! expanded through group inheritance, and sequences, whose steps are
//! validated one after the other until a step produces violations.

use constraints_core::{ClassRegistry, Group, Result, ValidationError};

/// A group sequence expanded into steps.
///
/// Every step holds the sequence member followed by the groups it inherits
/// from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The sequence
    pub group: Group,
    /// Steps in order
    pub steps: Vec<Vec<Group>>,
}

/// Groups and sequences of one validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOrder {
    groups: Vec<Group>,
    sequences: Vec<Sequence>,
}

impl ValidationOrder {
    /// Computes the order for `requested` groups; no groups means `Default`.
    pub fn build(requested: &[Group], registry: &ClassRegistry) -> Result<Self> {
        let defaulted;
        let requested = if requested.is_empty() {
            defaulted = [Group::default_group()];
            &defaulted[..]
        } else {
            requested
        };

        let mut order = Self {
            groups: Vec::new(),
            sequences: Vec::new(),
        };
        for group in requested {
            if let Some(members) = registry.group_definition(group).and_then(|d| d.sequence.as_ref()) {
                if order.sequences.iter().any(|s| s.group == *group) {
                    continue;
                }
                let steps = Self::sequence_steps(group, members, registry)?;
                order.sequences.push(Sequence {
                    group: group.clone(),
                    steps,
                });
            } else {
                for inherited in with_inherited(group, registry)? {
                    if !order.groups.contains(&inherited) {
                        order.groups.push(inherited);
                    }
                }
            }
        }
        Ok(order)
    }

    /// Order for a cascaded value validated in `group`: the group alone, or
    /// the steps of the sequence it names.
    pub fn for_cascade(group: &Group, registry: &ClassRegistry) -> Result<Self> {
        match registry.group_definition(group).and_then(|d| d.sequence.as_ref()) {
            Some(members) => Ok(Self {
                groups: Vec::new(),
                sequences: vec![Sequence {
                    group: group.clone(),
                    steps: Self::sequence_steps(group, members, registry)?,
                }],
            }),
            None => Ok(Self {
                groups: vec![group.clone()],
                sequences: Vec::new(),
            }),
        }
    }

    /// Replaces the plain `Default` group by the steps of a redefined default
    /// group sequence.
    pub fn redefine_default(&mut self, steps: Vec<Vec<Group>>) {
        let default = Group::default_group();
        if let Some(position) = self.groups.iter().position(|g| *g == default) {
            self.groups.remove(position);
            self.sequences.insert(0, Sequence { group: default, steps });
        }
    }

    /// Expands the members of a sequence into steps.
    pub fn sequence_steps(sequence: &Group, members: &[Group], registry: &ClassRegistry) -> Result<Vec<Vec<Group>>> {
        members
            .iter()
            .map(|member| {
                if registry.is_sequence(member) {
                    return Err(ValidationError::group_definition(format!(
                        "Sequence '{}' contains the sequence '{}'",
                        sequence, member
                    )));
                }
                with_inherited(member, registry)
            })
            .collect()
    }

    /// Plain groups, validated together.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Sequences, each validated step by step.
    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }
}

/// The group followed by every group it inherits from, depth first.
fn with_inherited(group: &Group, registry: &ClassRegistry) -> Result<Vec<Group>> {
    fn visit(group: &Group, registry: &ClassRegistry, stack: &mut Vec<Group>, out: &mut Vec<Group>) -> Result<()> {
        if stack.contains(group) {
            return Err(ValidationError::group_definition(format!(
                "Cyclic group inheritance: {} -> {}",
                stack.iter().map(Group::name).collect::<Vec<_>>().join(" -> "),
                group
            )));
        }
        if !out.contains(group) {
            out.push(group.clone());
        }
        stack.push(group.clone());
        for parent in registry.parent_groups(group) {
            visit(&parent, registry, stack, out)?;
        }
        stack.pop();
        Ok(())
    }

    let mut out = Vec::new();
    visit(group, registry, &mut Vec::new(), &mut out)?;
    Ok(out)
}
