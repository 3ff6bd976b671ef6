//! Static validation of tariff definitions.
//!
//! The restriction matcher resolves overlaps by element order and silently
//! passes unmatched deltas through at zero cost. Both behaviors are correct at
//! runtime but usually point at a misconfigured tariff, which is a catalog
//! problem. This linter surfaces those configurations before a tariff is
//! assigned to a connector.

use std::fmt::Display;

use crate::tariff::{Tariff, TariffRestriction};

/// A suspect spot in a tariff definition.
#[derive(Debug, PartialEq, Eq)]
pub enum Warning {
    /// An element without price components can match deltas but never price
    /// them.
    ElementHasNoComponents {
        /// Index of the element.
        element_index: usize,
    },
    /// A second component of the same type within one element is never
    /// billed.
    DuplicateComponentType {
        /// Index of the element.
        element_index: usize,
        /// Index of the redundant component.
        component_index: usize,
    },
    /// An earlier element without restrictions matches every delta, elements
    /// after it are unreachable.
    ElementIsShadowed {
        /// Index of the unreachable element.
        element_index: usize,
        /// Index of the unrestricted element shadowing it.
        shadowed_by: usize,
    },
    /// A restriction tier with `min` above `max` can never accept a delta.
    TierIsInverted {
        /// Index of the element.
        element_index: usize,
        /// The dimension with the inverted tier.
        dimension: &'static str,
    },
    /// `step_size` is carried in the model but costing does not consume it.
    StepSizeHasNoEffect {
        /// Index of the element.
        element_index: usize,
        /// Index of the component carrying a non-zero step size.
        component_index: usize,
    },
}

impl Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ElementHasNoComponents { element_index } => write!(
                f,
                "Element at `$.elements[{element_index}]` has no price components, matched deltas are not billed."
            ),
            Self::DuplicateComponentType {
                element_index,
                component_index,
            } => write!(
                f,
                "Component at `$.elements[{element_index}].price_components[{component_index}]` repeats an earlier type and is never billed."
            ),
            Self::ElementIsShadowed {
                element_index,
                shadowed_by,
            } => write!(
                f,
                "Element at `$.elements[{element_index}]` is unreachable, the unrestricted element at `$.elements[{shadowed_by}]` matches first."
            ),
            Self::TierIsInverted {
                element_index,
                dimension,
            } => write!(
                f,
                "Element at `$.elements[{element_index}]` has an inverted {dimension} tier, it can never match."
            ),
            Self::StepSizeHasNoEffect {
                element_index,
                component_index,
            } => write!(
                f,
                "Component at `$.elements[{element_index}].price_components[{component_index}]` sets a step size, which costing does not apply."
            ),
        }
    }
}

/// Lint the provided tariff and produce a set of relevant warnings.
pub fn lint(tariff: &Tariff) -> Vec<Warning> {
    let mut warnings = Vec::new();
    let mut unrestricted: Option<usize> = None;

    for (element_index, element) in tariff.elements.iter().enumerate() {
        if let Some(shadowed_by) = unrestricted {
            warnings.push(Warning::ElementIsShadowed {
                element_index,
                shadowed_by,
            });
        }

        if element.price_components.is_empty() {
            warnings.push(Warning::ElementHasNoComponents { element_index });
        }

        let mut seen = Vec::new();
        for (component_index, component) in element.price_components.iter().enumerate() {
            if seen.contains(&component.component_type) {
                warnings.push(Warning::DuplicateComponentType {
                    element_index,
                    component_index,
                });
            } else {
                seen.push(component.component_type);
            }

            if component.step_size != 0 {
                warnings.push(Warning::StepSizeHasNoEffect {
                    element_index,
                    component_index,
                });
            }
        }

        match &element.restrictions {
            Some(restrictions) => {
                for dimension in inverted_tiers(restrictions) {
                    warnings.push(Warning::TierIsInverted {
                        element_index,
                        dimension,
                    });
                }

                if is_unbounded(restrictions) && unrestricted.is_none() {
                    unrestricted = Some(element_index);
                }
            }
            None => {
                if unrestricted.is_none() {
                    unrestricted = Some(element_index);
                }
            }
        }
    }

    warnings
}

fn inverted_tiers(restrictions: &TariffRestriction) -> Vec<&'static str> {
    let mut inverted = Vec::new();

    let unbounded_kwh = restrictions.min_kwh == Default::default()
        || restrictions.max_kwh == Default::default();
    if !unbounded_kwh && restrictions.min_kwh > restrictions.max_kwh {
        inverted.push("kWh");
    }

    let unbounded_current = restrictions.min_current == Default::default()
        || restrictions.max_current == Default::default();
    if !unbounded_current && restrictions.min_current > restrictions.max_current {
        inverted.push("current");
    }

    let unbounded_power = restrictions.min_power == Default::default()
        || restrictions.max_power == Default::default();
    if !unbounded_power && restrictions.min_power > restrictions.max_power {
        inverted.push("power");
    }

    let unbounded_duration = restrictions.min_duration == 0 || restrictions.max_duration == 0;
    if !unbounded_duration && restrictions.min_duration > restrictions.max_duration {
        inverted.push("duration");
    }

    inverted
}

/// Whether a restriction set accepts every delta, i.e. has no populated
/// dimension.
fn is_unbounded(restrictions: &TariffRestriction) -> bool {
    restrictions.start_time.is_none()
        && restrictions.end_time.is_none()
        && restrictions.start_date.is_none()
        && restrictions.end_date.is_none()
        && restrictions.min_kwh == Default::default()
        && restrictions.max_kwh == Default::default()
        && restrictions.min_current == Default::default()
        && restrictions.max_current == Default::default()
        && restrictions.min_power == Default::default()
        && restrictions.max_power == Default::default()
        && restrictions.min_duration == 0
        && restrictions.max_duration == 0
        && restrictions.day_of_week.is_empty()
}
