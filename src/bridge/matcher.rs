//! Matches runtime types to carrier slots.

use std::any::TypeId;

use bevy::prelude::*;
use bevy::reflect::{DynamicEnum, DynamicVariant, TypeInfo, TypeRegistry, VariantInfo};
use bevy::utils::HashMap;

use super::carrier::{CarrierSlot, CARRIER_SLOTS};

type Convert = fn(&dyn Reflect) -> Option<Box<dyn Reflect>>;

struct Subtype {
    parent: TypeId,
    upcast: Convert,
    downcast: Convert,
}

/// The result of matching a type to a carrier slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// Index into [`CARRIER_SLOTS`] and into the carrier's fields.
    pub slot: usize,
    /// The types between the matched type (first) and the slot type (excluded). Empty for exact
    /// matches.
    lineage: Vec<TypeId>,
}

impl Binding {
    pub fn carrier_slot(&self) -> &'static CarrierSlot {
        &CARRIER_SLOTS[self.slot]
    }

    pub fn is_exact(&self) -> bool {
        self.lineage.is_empty()
    }
}

/// Finds the carrier slot for a type. Slots are tried in declaration order and the first one
/// whose type is the queried type, or one of its registered supertypes, wins. Results are cached
/// per type, including the lack of a match.
#[derive(Default)]
pub struct CarrierMatcher {
    subtypes: HashMap<TypeId, Subtype>,
    bindings: HashMap<TypeId, Option<Binding>>,
    scans: usize,
}

fn upcast<Sub, Super>(value: &dyn Reflect) -> Option<Box<dyn Reflect>>
where
    Sub: FromReflect + Into<Super>,
    Super: Reflect,
{
    let value: Super = Sub::from_reflect(value)?.into();
    Some(Box::new(value) as Box<dyn Reflect>)
}

fn downcast<Sub, Super>(value: &dyn Reflect) -> Option<Box<dyn Reflect>>
where
    Sub: Reflect,
    Super: FromReflect + Into<Sub>,
{
    let value: Sub = Super::from_reflect(value)?.into();
    Some(Box::new(value) as Box<dyn Reflect>)
}

impl CarrierMatcher {
    /// Declare `Sub` a subtype of `Super`, so values of `Sub` are edited with whatever carrier
    /// slot `Super` would use. Conversions go through `Into` in both directions.
    ///
    /// This clears every cached binding.
    pub fn register_subtype<Sub, Super>(&mut self)
    where
        Sub: FromReflect + Into<Super>,
        Super: FromReflect + Into<Sub>,
    {
        self.subtypes.insert(
            TypeId::of::<Sub>(),
            Subtype {
                parent: TypeId::of::<Super>(),
                upcast: upcast::<Sub, Super>,
                downcast: downcast::<Sub, Super>,
            },
        );
        self.bindings.clear();
    }

    /// How many times the slot table has been scanned. Cached lookups do not scan.
    pub fn scans(&self) -> usize {
        self.scans
    }

    /// Find the carrier slot for `type_id`.
    pub fn resolve(&mut self, type_id: TypeId) -> Option<Binding> {
        if let Some(binding) = self.bindings.get(&type_id) {
            return binding.clone();
        }

        self.scans += 1;
        let ancestry = self.ancestry(type_id);
        let binding = CARRIER_SLOTS.iter().enumerate().find_map(|(slot, candidate)| {
            let depth = ancestry.iter().position(|&ty| ty == candidate.type_id())?;
            Some(Binding {
                slot,
                lineage: ancestry[..depth].to_vec(),
            })
        });

        if binding.is_none() {
            debug!("no carrier slot for {type_id:?}, values of it will be read-only");
        }
        self.bindings.insert(type_id, binding.clone());
        binding
    }

    /// The type itself followed by its registered supertypes, nearest first.
    fn ancestry(&self, type_id: TypeId) -> Vec<TypeId> {
        let mut ancestry = vec![type_id];
        let mut current = type_id;
        while let Some(subtype) = self.subtypes.get(&current) {
            if ancestry.contains(&subtype.parent) {
                warn!("subtype cycle through {:?}", subtype.parent);
                break;
            }
            ancestry.push(subtype.parent);
            current = subtype.parent;
        }
        ancestry
    }

    /// Convert a value of the bound type into a concrete value of the slot type.
    pub fn upcast(&self, binding: &Binding, value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
        let mut lineage = binding.lineage.iter();
        let Some(first) = lineage.next() else {
            return binding.carrier_slot().from_reflect(value);
        };

        let mut current = (self.subtypes.get(first)?.upcast)(value)?;
        for ty in lineage {
            current = (self.subtypes.get(ty)?.upcast)(&*current)?;
        }
        Some(current)
    }

    /// Convert a value of the slot type back into a concrete value of the bound type.
    pub fn downcast(&self, binding: &Binding, value: &dyn Reflect) -> Option<Box<dyn Reflect>> {
        let mut lineage = binding.lineage.iter().rev();
        let Some(last) = lineage.next() else {
            return binding.carrier_slot().from_reflect(value);
        };

        let mut current = (self.subtypes.get(last)?.downcast)(value)?;
        for ty in lineage {
            current = (self.subtypes.get(ty)?.downcast)(&*current)?;
        }
        Some(current)
    }

    /// A default value for a type: the zero value of its carrier slot if it has one, otherwise
    /// its reflected [`Default`], otherwise `None` for option types.
    pub fn default_for(
        &mut self,
        type_id: TypeId,
        registry: &TypeRegistry,
    ) -> Option<Box<dyn Reflect>> {
        if let Some(binding) = self.resolve(type_id) {
            let zero = binding.carrier_slot().default_value();
            if let Some(value) = self.downcast(&binding, &*zero) {
                return Some(value);
            }
        }

        if let Some(default) = registry.get_type_data::<ReflectDefault>(type_id) {
            return Some(default.default());
        }

        let info = registry.get_type_info(type_id)?;
        match info {
            TypeInfo::Enum(info)
                if matches!(info.variant("None"), Some(VariantInfo::Unit(_)))
                    && info.type_path().starts_with("core::option::Option") =>
            {
                let mut none = DynamicEnum::new("None", DynamicVariant::Unit);
                none.set_represented_type(Some(registry.get_type_info(type_id)?));
                Some(Box::new(none))
            }
            _ => None,
        }
    }
}
