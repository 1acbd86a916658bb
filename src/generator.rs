//! Native declaration generation for whole signatures.
//!
//! The [`SignatureGenerator`] ties a [`TypeUniverse`], a shared [`DefinitionCache`] and a
//! [`GeneratorConfig`] together. It classifies a method or delegate while holding the cache
//! lock, then prints every definition the signature depends on, in dependency order with
//! forward declarations breaking cycles, followed by the prototype itself. Diagnostics are
//! buffered while printing and replayed once the code is complete.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use marshalscope::prelude::*;
//!
//! let universe = Arc::new(TypeUniverse::new());
//! let method = PInvokeMethod::new("GetTickCount", universe.builtin(Builtin::UInt32)).exact_spelling();
//!
//! let generator = SignatureGenerator::new(universe, GeneratorConfig::win32());
//! let generated = generator.generate_pinvoke(&method)?;
//! assert_eq!(generated.code, "UINT WINAPI GetTickCount();\n\n");
//! # Ok::<(), marshalscope::Error>(())
//! ```

use std::{fmt, io, sync::Arc};

use crate::{
    config::GeneratorConfig,
    marshal::{
        definitions::{Definition, DefinitionCache, SetItem, SharedDefinitionCache},
        native::Classifier,
        signature::{ComMethod, NativeSignature, PInvokeMethod},
        universe::{TypeRef, TypeUniverse},
    },
    output::{
        CodePrinter, FacadeLogPrinter, LogMemoryPrinter, LogPrinter, LogTextPrinter,
        TextCodePrinter,
    },
    Result,
};

/// Code and diagnostics generated for one signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedCode {
    /// Definitions followed by the prototype
    pub code: String,
    /// Diagnostics, one line each
    pub messages: String,
}

impl fmt::Display for GeneratedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Prints native declarations for P/Invoke methods, COM methods and delegates.
///
/// Generators sharing one [`SharedDefinitionCache`] share the definitions, so a structure used
/// by several signatures is laid out once.
pub struct SignatureGenerator {
    config: GeneratorConfig,
    universe: Arc<TypeUniverse>,
    cache: SharedDefinitionCache,
}

impl SignatureGenerator {
    /// Creates a generator with its own definition cache.
    #[must_use]
    pub fn new(universe: Arc<TypeUniverse>, config: GeneratorConfig) -> Self {
        Self::with_cache(universe, DefinitionCache::shared(), config)
    }

    /// Creates a generator using an existing definition cache.
    #[must_use]
    pub fn with_cache(
        universe: Arc<TypeUniverse>,
        cache: SharedDefinitionCache,
        config: GeneratorConfig,
    ) -> Self {
        SignatureGenerator {
            config,
            universe,
            cache,
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The type universe.
    #[must_use]
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// The shared definition cache.
    #[must_use]
    pub fn cache(&self) -> &SharedDefinitionCache {
        &self.cache
    }

    fn classify<T>(&self, run: impl FnOnce(&mut Classifier<'_>) -> T) -> Result<T> {
        let mut cache = lock!(self.cache)?;
        let mut classifier = Classifier::new(&self.universe, &mut cache);
        Ok(run(&mut classifier))
    }

    /// Classifies a P/Invoke method.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn pinvoke_signature(&self, method: &PInvokeMethod) -> Result<NativeSignature> {
        let platform = self.config.marshal_flags();
        self.classify(|classifier| NativeSignature::from_pinvoke(classifier, method, platform))
    }

    /// Classifies a COM interop method.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn com_signature(&self, method: &ComMethod) -> Result<NativeSignature> {
        let platform = self.config.marshal_flags();
        self.classify(|classifier| NativeSignature::from_com_method(classifier, method, platform))
    }

    /// Classifies a delegate as a function pointer.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn delegate_signature(&self, delegate: TypeRef) -> Result<NativeSignature> {
        let platform = self.config.marshal_flags();
        self.classify(|classifier| NativeSignature::from_delegate(classifier, delegate, platform))
    }

    /// Prints the definitions a signature depends on, then the signature.
    ///
    /// Every declaration is followed by an empty line. Diagnostics go to `log_printer` after
    /// the code, closed by a separator.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn print(
        &self,
        signature: &NativeSignature,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
    ) -> Result<()> {
        let flags = self.config.print_flags();
        let mut messages = LogMemoryPrinter::new();

        if !self.config.suppress_type_definitions {
            for (item, definition) in self.ordered_definitions(signature)? {
                match item {
                    SetItem::Forward(_) => definition.print_forward_to(printer, &mut messages),
                    SetItem::Definition {
                        forward_declared, ..
                    } => definition.print_to(printer, &mut messages, flags, forward_declared),
                }
                printer.print_ln();
                printer.print_ln();
            }
        }

        signature.print_to(printer, &mut messages, flags);
        printer.print_ln();
        printer.print_ln();

        if !self.config.suppress_messages {
            messages.replay_to(log_printer);
            log_printer.separate();
        }
        Ok(())
    }

    fn ordered_definitions(
        &self,
        signature: &NativeSignature,
    ) -> Result<Vec<(SetItem, Arc<Definition>)>> {
        let cache = lock!(self.cache)?;
        let set = signature.definition_set(&cache);

        let items = set
            .walk()
            .into_iter()
            .filter_map(|item| {
                let handle = match item {
                    SetItem::Forward(handle) | SetItem::Definition { handle, .. } => handle,
                };
                cache.get(handle).map(|definition| (item, Arc::clone(definition)))
            })
            .collect::<Vec<_>>();

        log::debug!(
            "printing {} with {} definition(s)",
            signature.name(),
            items.len()
        );
        Ok(items)
    }

    /// Renders a signature into strings.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn generate(&self, signature: &NativeSignature) -> Result<GeneratedCode> {
        let mut printer = TextCodePrinter::new();
        let mut log_printer = LogTextPrinter::new();
        self.print(signature, &mut printer, &mut log_printer)?;

        Ok(GeneratedCode {
            code: printer.into_string(),
            messages: log_printer.into_string(),
        })
    }

    /// Classifies and renders a P/Invoke method.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn generate_pinvoke(&self, method: &PInvokeMethod) -> Result<GeneratedCode> {
        let signature = self.pinvoke_signature(method)?;
        self.generate(&signature)
    }

    /// Classifies and renders a COM interop method.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn generate_com_method(&self, method: &ComMethod) -> Result<GeneratedCode> {
        let signature = self.com_signature(method)?;
        self.generate(&signature)
    }

    /// Classifies and renders a delegate.
    ///
    /// # Errors
    /// Returns [`crate::Error::LockError`] if the definition cache is poisoned.
    pub fn generate_delegate(&self, delegate: TypeRef) -> Result<GeneratedCode> {
        let signature = self.delegate_signature(delegate)?;
        self.generate(&signature)
    }

    /// Writes the code of a signature to an I/O sink; diagnostics are forwarded to the `log`
    /// crate.
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] if writing fails and [`crate::Error::LockError`] if the
    /// definition cache is poisoned.
    pub fn write_to(&self, signature: &NativeSignature, writer: &mut dyn io::Write) -> Result<()> {
        let mut printer = TextCodePrinter::new();
        let mut log_printer = FacadeLogPrinter::new();
        self.print(signature, &mut printer, &mut log_printer)?;

        writer.write_all(printer.as_str().as_bytes())?;
        Ok(())
    }

    /// Appends the code of a signature to a formatter sink.
    ///
    /// # Errors
    /// Returns [`crate::Error::Fmt`] if writing fails and [`crate::Error::LockError`] if the
    /// definition cache is poisoned.
    pub fn write_fmt_to(&self, signature: &NativeSignature, out: &mut dyn fmt::Write) -> Result<()> {
        let generated = self.generate(signature)?;
        out.write_str(&generated.code)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        marshal::{
            descriptor::{ParamAttributes, ParameterInfo},
            universe::Builtin,
        },
        test::{add_callback, add_point},
    };

    #[test]
    fn test_definitions_precede_signature() {
        let universe = Arc::new(TypeUniverse::new());
        let point = add_point(&universe);
        let method = PInvokeMethod::new("MovePoint", universe.builtin(Builtin::Void))
            .exact_spelling()
            .with_param(ParameterInfo::new("pt", point).by_ref());

        let generator = SignatureGenerator::new(Arc::clone(&universe), GeneratorConfig::win32());
        let generated = generator.generate_pinvoke(&method).unwrap();

        assert_eq!(
            generated.code,
            "#pragma pack (push)\n#pragma pack (8)\nstruct Point // size = 8 bytes\n{\n    INT x;\n    INT y;\n};\n#pragma pack (pop)\n\n\
             VOID WINAPI MovePoint(struct Point * pt);\n\n"
        );
        assert!(generated.messages.contains("Parameter pt: "));
    }

    #[test]
    fn test_suppression() {
        let universe = Arc::new(TypeUniverse::new());
        let point = add_point(&universe);
        let method = PInvokeMethod::new("MovePoint", universe.builtin(Builtin::Void))
            .exact_spelling()
            .with_param(ParameterInfo::new("pt", point).by_ref());

        let config = GeneratorConfig {
            suppress_type_definitions: true,
            suppress_messages: true,
            ..GeneratorConfig::win32()
        };
        let generated = SignatureGenerator::new(universe, config).generate_pinvoke(&method).unwrap();

        assert_eq!(generated.code, "VOID WINAPI MovePoint(struct Point * pt);\n\n");
        assert!(generated.messages.is_empty());
    }

    #[test]
    fn test_shared_cache() {
        let universe = Arc::new(TypeUniverse::new());
        let point = add_point(&universe);
        let callback = add_callback(&universe);
        let cache = DefinitionCache::shared();

        let first = SignatureGenerator::with_cache(
            Arc::clone(&universe),
            Arc::clone(&cache),
            GeneratorConfig::win32(),
        );
        let second =
            SignatureGenerator::with_cache(Arc::clone(&universe), Arc::clone(&cache), GeneratorConfig::win32());

        let method = PInvokeMethod::new("Offset", universe.builtin(Builtin::Void))
            .exact_spelling()
            .with_param(ParameterInfo::new("pt", point).by_ref());
        first.pinvoke_signature(&method).unwrap();
        second.pinvoke_signature(&method).unwrap();
        assert_eq!(cache.lock().unwrap().len(), 1);

        let a = first.delegate_signature(callback).unwrap();
        let b = second.delegate_signature(callback).unwrap();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(first.cache(), second.cache()));
    }

    #[test]
    fn test_marshal_direction() {
        let universe = Arc::new(TypeUniverse::new());
        let method = PInvokeMethod::new("Swap", universe.builtin(Builtin::Void))
            .exact_spelling()
            .with_param(
                ParameterInfo::new("value", universe.builtin(Builtin::Int32))
                    .by_ref()
                    .with_attributes(ParamAttributes::IN | ParamAttributes::OUT),
            );

        let config = GeneratorConfig {
            print_marshal_direction: true,
            ..GeneratorConfig::win32()
        };
        let generator = SignatureGenerator::new(universe, config);
        let signature = generator.pinvoke_signature(&method).unwrap();

        let mut out = String::new();
        generator.write_fmt_to(&signature, &mut out).unwrap();
        assert_eq!(out, "VOID WINAPI Swap(/*[in,out]*/ LPINT value);\n\n");

        let mut bytes = Vec::new();
        generator.write_to(&signature, &mut bytes).unwrap();
        assert_eq!(bytes, out.as_bytes());
    }
}
