//! The entity abstraction shared by every table

use std::sync::Arc;

use crate::RowId;

/// One row's underlying data record.
///
/// The engine is generic over entity shape: beyond the id it only reads
/// fields through the accessors declared in a table's field configuration.
pub trait Entity {
    /// Stable unique identifier of this row
    fn id(&self) -> RowId;
}

impl<E: Entity + ?Sized> Entity for Arc<E> {
    fn id(&self) -> RowId {
        (**self).id()
    }
}

impl<E: Entity + ?Sized> Entity for Box<E> {
    fn id(&self) -> RowId {
        (**self).id()
    }
}
