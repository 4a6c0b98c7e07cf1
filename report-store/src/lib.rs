// BEGIN - Embark standard lints v6 for Rust 1.55+
// do not change or add/remove here, but one can add exceptions after this section
// for more info see: <https://github.com/EmbarkStudios/rust-ecosystem/issues/59>
#![deny(unsafe_code)]
#![warn(
    clippy::all,
    clippy::await_holding_lock,
    clippy::char_lit_as_u8,
    clippy::checked_conversions,
    clippy::dbg_macro,
    clippy::debug_assert_with_mut_call,
    clippy::doc_markdown,
    clippy::empty_enum,
    clippy::enum_glob_use,
    clippy::exit,
    clippy::expl_impl_clone_on_copy,
    clippy::explicit_deref_methods,
    clippy::explicit_into_iter_loop,
    clippy::fallible_impl_from,
    clippy::filter_map_next,
    clippy::flat_map_option,
    clippy::float_cmp_const,
    clippy::fn_params_excessive_bools,
    clippy::from_iter_instead_of_collect,
    clippy::if_let_mutex,
    clippy::implicit_clone,
    clippy::imprecise_flops,
    clippy::inefficient_to_string,
    clippy::invalid_upcast_comparisons,
    clippy::large_digit_groups,
    clippy::large_stack_arrays,
    clippy::large_types_passed_by_value,
    clippy::let_unit_value,
    clippy::linkedlist,
    clippy::lossy_float_literal,
    clippy::macro_use_imports,
    clippy::manual_ok_or,
    clippy::map_err_ignore,
    clippy::map_flatten,
    clippy::map_unwrap_or,
    clippy::match_on_vec_items,
    clippy::match_same_arms,
    clippy::match_wild_err_arm,
    clippy::match_wildcard_for_single_variants,
    clippy::mem_forget,
    clippy::mismatched_target_os,
    clippy::missing_enforced_import_renames,
    clippy::mut_mut,
    clippy::mutex_integer,
    clippy::needless_borrow,
    clippy::needless_continue,
    clippy::needless_for_each,
    clippy::option_option,
    clippy::path_buf_push_overwrite,
    clippy::ptr_as_ptr,
    clippy::rc_mutex,
    clippy::ref_option_ref,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_functions_in_if_condition,
    clippy::semicolon_if_nothing_returned,
    clippy::single_match_else,
    clippy::string_add_assign,
    clippy::string_add,
    clippy::string_lit_as_bytes,
    clippy::string_to_string,
    clippy::todo,
    clippy::trait_duplication_in_bounds,
    clippy::unimplemented,
    clippy::unnested_or_patterns,
    clippy::unused_self,
    clippy::useless_transmute,
    clippy::verbose_file_reads,
    clippy::zero_sized_map_values,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms
)]
// END - Embark standard lints v6 for Rust 1.55+
// crate-specific exceptions:

//! Persistence for [`FaultReport`]s.
//!
//! The [`ReportStore`] trait is the seam the interceptor writes through, and
//! [`FsReportStore`] is the implementation that writes each report as a plain
//! text file into a single directory, see [`format`] for the layout.

mod errors;
pub mod format;
mod fs;

pub use errors::{StorageError, StorageErrorKind};
pub use format::PersistedReport;
pub use fs::{DEFAULT_DATE_FORMAT, DEFAULT_DIR_NAME, FsReportStore, StoreConfig};

use fault_report::FaultReport;
use std::{path::PathBuf, time::Duration};

/// How long reports are kept by [`ReportStore::purge_default`], 7 days
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A durable location that reports can be persisted to and expired from
pub trait ReportStore: Send + Sync {
    /// Persists the report, returning the location it was written to.
    ///
    /// An existing artifact with the same computed name is replaced, never
    /// merged with.
    fn persist(&self, report: &FaultReport) -> Result<PathBuf, StorageError>;

    /// Removes every artifact that was last modified longer than `max_age`
    /// ago, returning the number removed.
    ///
    /// This never fails, individual failures are logged and skipped.
    fn purge_older_than(&self, max_age: Duration) -> usize;

    /// [`Self::purge_older_than`] with the [`DEFAULT_RETENTION`]
    #[inline]
    fn purge_default(&self) -> usize {
        self.purge_older_than(DEFAULT_RETENTION)
    }
}
