//! Data structures for the coffee-microbiome analysis.

mod abundance;
mod dataset;
mod group;
mod metadata;
mod result;
mod table;
mod taxonomy;

pub use abundance::{AbundanceMatrix, Orientation};
pub use dataset::{
    AbundanceInput, Dataset, InputConfig, JoinPolicy, LoaderOptions, MetadataInput, Sample,
    TaxonomyInput,
};
pub use group::GroupLabel;
pub use metadata::{Metadata, Variable, VariableType};
pub use result::{DaResult, DaResultSet, ResultSummary, CONTRAST};
pub use table::TableFormat;
pub use taxonomy::{Taxon, Taxonomy, TaxonomyFormat, RANKS};
