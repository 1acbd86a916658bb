// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # marshalscope
//!
//! Native declarations for .NET interop signatures.
//!
//! Given a description of managed types and of a P/Invoke method, a COM interop method or a
//! delegate, `marshalscope` works out the native type the runtime marshaler passes for every
//! parameter, return value and structure field, lays structures out the way the marshaler does,
//! and prints a C/C++ prototype together with every structure, enum and callback typedef it
//! depends on. Every decision that may surprise a native caller is reported as a diagnostic
//! with a stable code.
//!
//! ## Features
//!
//! - **Classification** - The full matrix of managed types and `MarshalAs` representations,
//!   including strings, arrays, SAFEARRAYs, VARIANTs, interfaces and delegates
//! - **Layout** - Sequential and explicit layout with packing, explicit sizes and union
//!   detection
//! - **Two dialects** - Windows SDK aliases (`LPCWSTR`, `UINT`) or portable C
//!   (`const wchar_t *`, `unsigned int`)
//! - **Dependency ordering** - Definitions are printed before their users, with forward
//!   declarations breaking cycles
//! - **Diagnostics** - Errors, warnings and hints attached to the symbol they concern
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use marshalscope::prelude::*;
//!
//! let universe = Arc::new(TypeUniverse::new());
//! let method = PInvokeMethod::new("Beep", universe.builtin(Builtin::Boolean))
//!     .exact_spelling()
//!     .with_param(ParameterInfo::new("frequency", universe.builtin(Builtin::UInt32)))
//!     .with_param(ParameterInfo::new("duration", universe.builtin(Builtin::UInt32)));
//!
//! let generator = SignatureGenerator::new(universe, GeneratorConfig::win32());
//! let generated = generator.generate_pinvoke(&method)?;
//! assert_eq!(generated.code, "BOOL WINAPI Beep(UINT frequency, UINT duration);\n\n");
//! # Ok::<(), marshalscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`marshal::universe`] - The managed types a signature refers to
//! - [`marshal::native`] - Classification of one occurrence of a managed type
//! - [`marshal::definitions`] - Structures, enums and callbacks printed out of line
//! - [`marshal::signature`] - Native prototypes
//! - [`generator`] - Printing a signature with everything it depends on
//! - [`diagnostics`] - Messages attached to classified symbols
//! - [`output`] - Token sinks for code and for diagnostics
//!
//! ## Logging
//!
//! Internal progress is reported through the [`log`](https://docs.rs/log) facade at debug
//! level. [`output::FacadeLogPrinter`] forwards diagnostics to the same facade.
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use marshalscope::prelude::*;
///
/// let universe = TypeUniverse::new();
/// let int32 = universe.builtin(Builtin::Int32);
/// assert_eq!(universe.full_name(int32), "System.Int32");
/// ```
pub mod prelude;

/// Generator configuration
pub mod config;

/// Diagnostics attached to classified symbols
pub mod diagnostics;

pub mod generator;

/// Marshaling classification and native layout
pub mod marshal;

/// Code and diagnostic sinks
///
/// Printers receive tokens tagged with an [`output::OutputType`] so that a front end can
/// colorize the declarations; [`output::TextCodePrinter`] simply concatenates them.
pub mod output;

/// `marshalscope` Result type
///
/// A type alias for `std::result::Result<T, Error>`. Classification itself never fails;
/// errors come from building the type universe, a poisoned definition cache and output sinks.
pub type Result<T> = std::result::Result<T, Error>;

/// `marshalscope` Error type
///
/// # Examples
///
/// ```rust
/// use marshalscope::{marshal::TypeUniverse, Error};
///
/// let universe = TypeUniverse::new();
/// match universe.find("Contoso.Missing") {
///     Err(Error::TypeNotFound(name)) => assert_eq!(name, "Contoso.Missing"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;

pub use config::GeneratorConfig;
pub use generator::{GeneratedCode, SignatureGenerator};
