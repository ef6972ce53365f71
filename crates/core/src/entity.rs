//! Entity trait: identity + the table a record lives in.

use uuid::Uuid;

use crate::schema::Table;

/// A record stored as one row of a remote table.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Into<Uuid>;

    /// Table the record is read from and written to.
    const TABLE: Table;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
