pub(crate) mod multipolygon;
