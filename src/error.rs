use thiserror::Error;

/// Failures while editing a map through its view. None of these are fatal, they are reported to
/// the user and the map is left as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingEditError {
    /// The default key of a new row is already a key of the map. Inserting it would silently
    /// overwrite that entry.
    #[error("the map already has an entry for {key}, edit that key before adding another row")]
    KeyCollision { key: String },
    /// No default value could be made for a new row's key or value.
    #[error("cannot create a default {role} of type {type_name}")]
    NoDefault {
        role: &'static str,
        type_name: String,
    },
    /// The map field could not be found on the component anymore.
    #[error("{component} has no map field `{field}`")]
    MissingField { component: String, field: String },
}
