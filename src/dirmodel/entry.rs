//! Directory entries.
//!
//! An [`Entry`] is a DN plus its stored attributes. Virtual attributes are not
//! stored: [`Entry::virtual_attributes`] and [`Entry::visible_attributes`]
//! compute them from a list of rules each time they are asked for, resolving
//! clashes with real attributes by each rule's [`ConflictBehavior`].

use std::sync::Arc;

use crate::attribute::{
    Attribute, AttributeBuilder, AttributeDescription, ConflictBehavior, RealAttribute,
    VirtualAttribute, VirtualAttributeRule,
};
use crate::schema::AttributeType;

#[derive(Debug, Clone, Default)]
pub struct Entry {
    dn: String,
    attributes: Vec<RealAttribute>,
}

impl Entry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Adds an attribute. Values of an attribute with an equal description
    /// are appended to the existing one.
    pub fn add_attribute(&mut self, attribute: RealAttribute) {
        let existing = self
            .attributes
            .iter()
            .position(|a| a.attribute_description() == attribute.attribute_description());
        match existing {
            Some(index) => {
                let current = &self.attributes[index];
                let merged = RealAttribute::new(
                    current.attribute_description().clone(),
                    current.values().chain(attribute.values()),
                );
                self.attributes[index] = merged;
            }
            None => self.attributes.push(attribute),
        }
    }

    pub fn with_attribute(mut self, attribute: RealAttribute) -> Self {
        self.add_attribute(attribute);
        self
    }

    pub fn attributes(&self) -> &[RealAttribute] {
        &self.attributes
    }

    /// The stored attribute with exactly this description.
    pub fn attribute(&self, description: &AttributeDescription) -> Option<&RealAttribute> {
        self.attributes
            .iter()
            .find(|a| a.attribute_description() == description)
    }

    /// Stored attributes of `attribute_type` or one of its sub types, with
    /// any options.
    pub fn attributes_of_type<'a>(
        &'a self,
        attribute_type: &'a AttributeType,
    ) -> impl Iterator<Item = &'a RealAttribute> + 'a {
        self.attributes
            .iter()
            .filter(move |a| a.attribute_type().is_sub_type_of(attribute_type))
    }

    fn has_real(&self, attribute_type: &AttributeType) -> bool {
        self.attributes
            .iter()
            .any(|a| a.attribute_type().as_ref() == attribute_type)
    }

    /// The virtual attributes the rules contribute to this entry.
    ///
    /// A rule is skipped when it does not apply to the entry, or when the
    /// entry stores the same type and real values take precedence.
    pub fn virtual_attributes<'a>(
        &'a self,
        rules: &'a [VirtualAttributeRule],
    ) -> Vec<VirtualAttribute<'a>> {
        rules
            .iter()
            .filter(|rule| rule.applies_to(self))
            .filter(|rule| {
                rule.conflict_behavior() != ConflictBehavior::RealOverridesVirtual
                    || !self.has_real(rule.attribute_type())
            })
            .map(|rule| VirtualAttribute::new(Arc::clone(rule.attribute_type()), self, rule))
            .collect()
    }

    /// Every attribute a reader of this entry sees: stored attributes and
    /// virtual ones, with conflicts resolved.
    ///
    /// Merged attributes keep the real attribute's description and add the
    /// virtual values not already present.
    pub fn visible_attributes<'a>(
        &'a self,
        rules: &'a [VirtualAttributeRule],
    ) -> Vec<Box<dyn Attribute + 'a>> {
        let applicable: Vec<&VirtualAttributeRule> =
            rules.iter().filter(|rule| rule.applies_to(self)).collect();
        let mut visible: Vec<Box<dyn Attribute + 'a>> = Vec::new();

        for real in &self.attributes {
            let rule = applicable
                .iter()
                .find(|rule| rule.attribute_type() == real.attribute_type());
            match rule.map(|rule| (rule, rule.conflict_behavior())) {
                Some((_, ConflictBehavior::VirtualOverridesReal)) => {
                    tracing::trace!(
                        attribute = %real.attribute_description(),
                        "hidden by virtual attribute"
                    );
                }
                Some((rule, ConflictBehavior::MergeRealAndVirtual)) => {
                    let mut builder = AttributeBuilder::from_attribute(real, false);
                    builder.add_all(rule.provider().values(self, rule));
                    match builder.to_attribute() {
                        Ok(merged) => visible.push(Box::new(merged)),
                        Err(err) => {
                            tracing::warn!(%err, "cannot merge virtual values");
                            visible.push(Box::new(real));
                        }
                    }
                }
                _ => visible.push(Box::new(real)),
            }
        }

        for rule in applicable {
            if self.has_real(rule.attribute_type())
                && rule.conflict_behavior() != ConflictBehavior::VirtualOverridesReal
            {
                continue;
            }
            visible.push(Box::new(VirtualAttribute::new(
                Arc::clone(rule.attribute_type()),
                self,
                rule,
            )));
        }

        visible
    }
}
