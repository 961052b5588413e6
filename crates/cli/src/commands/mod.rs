pub(crate) mod backfill;
pub(crate) mod lookup;
pub(crate) mod migrate;
pub(crate) mod sync;
