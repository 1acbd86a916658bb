use uguid::{guid, Guid};

use super::{DefHandle, DefinitionCache, DefinitionSet};
use crate::{
    diagnostics::Log,
    marshal::{
        flags::MarshalFlags, ident::string_to_literal, native::Classifier,
        signature::NativeSignature, typename::TypeName, universe::TypeRef,
    },
    output::{CodePrinter, LogPrinter, OutputType, PrintFlags},
};

/// Name of the COM interface delegates are marshaled as.
pub const DELEGATE_INTERFACE_NAME: &str = "_Delegate";

/// Interface identifier of `_Delegate`.
pub const DELEGATE_INTERFACE_IID: Guid = guid!("FB6AB00F-5096-3AF8-A33D-D7885A5FA829");

/// A delegate marshaled as an unmanaged function pointer.
#[derive(Debug)]
pub struct FunctionPtrDefinition {
    signature: NativeSignature,
    pointer_size: u32,
}

impl FunctionPtrDefinition {
    pub(crate) fn build(
        classifier: &mut Classifier<'_>,
        ty: TypeRef,
        key_flags: MarshalFlags,
    ) -> FunctionPtrDefinition {
        FunctionPtrDefinition {
            signature: NativeSignature::from_delegate(classifier, ty, key_flags),
            pointer_size: key_flags.pointer_size(),
        }
    }

    /// Typedef name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.signature.name()
    }

    /// Pointer size.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.pointer_size
    }

    /// The prototype of the pointed-to function.
    #[must_use]
    pub fn signature(&self) -> &NativeSignature {
        &self.signature
    }

    /// Diagnostics of the delegate signature.
    #[must_use]
    pub fn log(&self) -> &Log {
        self.signature.log()
    }

    /// Prints `typedef ret (conv * Name)(params);`.
    ///
    /// Once a forward declaration was printed the pointer is wrapped in the structure that
    /// declaration announced, as member `ptr`.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
        forward_declared: bool,
    ) {
        if forward_declared {
            printer.print(OutputType::Keyword, "struct");
            printer.print(OutputType::Other, " ");
            printer.print_ln_with(OutputType::Identifier, self.name());

            printer.indent();
            printer.print(OutputType::Operator, "{");
            printer.print_ln();

            self.signature.print_as(printer, log_printer, flags, "ptr");

            printer.unindent();
            printer.print_ln();
            printer.print(OutputType::Operator, "};");
        } else {
            printer.print(OutputType::Keyword, "typedef");
            printer.print(OutputType::Other, " ");
            self.signature.print_to(printer, log_printer, flags);
        }
    }

    /// Prints `struct Name;`, the forward declaration of the wrapper structure.
    pub fn print_forward_to(&self, printer: &mut dyn CodePrinter, _log_printer: &mut dyn LogPrinter) {
        printer.print(OutputType::Keyword, "struct");
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Identifier, self.name());
        printer.print(OutputType::Operator, ";");
    }

    pub(crate) fn collect(&self, cache: &DefinitionCache, set: &mut DefinitionSet, handle: DefHandle) {
        self.signature.collect_definitions(cache, set, Some(handle));
    }
}

/// The `_Delegate` COM interface.
#[derive(Debug)]
pub struct DelegateInterfaceDefinition {
    log: Log,
    pointer_size: u32,
}

impl DelegateInterfaceDefinition {
    /// Creates the definition for the given pointer size.
    #[must_use]
    pub fn new(pointer_size: u32) -> Self {
        DelegateInterfaceDefinition {
            log: Log::new(),
            pointer_size,
        }
    }

    /// `_Delegate`.
    #[must_use]
    pub fn name(&self) -> &str {
        DELEGATE_INTERFACE_NAME
    }

    /// Size of an interface pointer.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.pointer_size
    }

    /// Always empty.
    #[must_use]
    pub fn log(&self) -> &Log {
        &self.log
    }

    /// Prints the `MIDL_INTERFACE` declaration with the `DynamicInvoke` method.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        _log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
    ) {
        let iid = DELEGATE_INTERFACE_IID.to_string().to_uppercase();

        printer.print(OutputType::Identifier, "MIDL_INTERFACE");
        printer.print(OutputType::Operator, "(");
        printer.print(OutputType::Literal, &string_to_literal(&iid));
        printer.print_ln_with(OutputType::Operator, ")");

        printer.print(OutputType::TypeName, DELEGATE_INTERFACE_NAME);
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Operator, ":");
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Keyword, "public");
        printer.print(OutputType::Other, " ");
        printer.print_ln_with(OutputType::TypeName, "IDispatch");

        printer.print_ln_with(OutputType::Operator, "{");
        printer.print(OutputType::Keyword, "public");
        printer.print_ln_with(OutputType::Operator, ":");

        printer.print(OutputType::Other, "    ");
        printer.print_ln_with(OutputType::Comment, "// methods omitted");

        printer.print(OutputType::Other, "    ");
        printer.print(OutputType::Keyword, "virtual");
        printer.print(OutputType::Other, " ");
        TypeName::ERROR.print_to(printer, flags, 0);
        printer.print(OutputType::Other, " ");
        if flags.contains(PrintFlags::USE_PLAIN_C) {
            printer.print(OutputType::Keyword, "__stdcall");
        } else {
            printer.print(OutputType::TypeName, "STDMETHODCALLTYPE");
        }
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Identifier, "DynamicInvoke");
        printer.print(OutputType::Operator, "(");

        TypeName::SAFEARRAY.print_to(printer, flags, 1);
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Identifier, "args");
        printer.print(OutputType::Operator, ",");
        printer.print(OutputType::Other, " ");

        TypeName::VARIANT.print_to(printer, flags, 1);
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Identifier, "pRetVal");
        printer.print(OutputType::Operator, ")");

        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Operator, "=");
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Literal, "0");
        printer.print_ln_with(OutputType::Operator, ";");

        printer.print(OutputType::Operator, "};");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        marshal::{definitions::Definition, universe::TypeUniverse},
        output::{LogMemoryPrinter, TextCodePrinter},
        test::add_callback,
    };

    #[test]
    fn test_delegate_interface() {
        let definition = DelegateInterfaceDefinition::new(4);
        let mut printer = TextCodePrinter::new();
        definition.print_to(&mut printer, &mut LogMemoryPrinter::new(), PrintFlags::empty());

        assert_eq!(
            printer.as_str(),
            "MIDL_INTERFACE(\"FB6AB00F-5096-3AF8-A33D-D7885A5FA829\")\n\
             _Delegate : public IDispatch\n\
             {\n\
             public:\n    // methods omitted\n    \
             virtual HRESULT STDMETHODCALLTYPE DynamicInvoke(LPSAFEARRAY args, LPVARIANT pRetVal) = 0;\n\
             };"
        );
    }

    #[test]
    fn test_function_pointer_forms() {
        let universe = TypeUniverse::new();
        let callback = add_callback(&universe);
        let mut cache = DefinitionCache::new();
        let native = Classifier::new(&universe, &mut cache).classify_type(callback, MarshalFlags::empty());

        let definition = match native.definition().and_then(|handle| cache.get(handle)).map(|d| &**d) {
            Some(Definition::FunctionPtr(definition)) => definition,
            other => panic!("expected a function pointer, got {other:?}"),
        };
        assert_eq!(definition.size(), 4);

        let mut printer = TextCodePrinter::new();
        definition.print_to(&mut printer, &mut LogMemoryPrinter::new(), PrintFlags::empty(), false);
        assert_eq!(
            printer.as_str(),
            "typedef BOOL (CALLBACK * EnumWindowsProc)(LPVOID hwnd, LPVOID lParam);"
        );

        let mut printer = TextCodePrinter::new();
        definition.print_to(&mut printer, &mut LogMemoryPrinter::new(), PrintFlags::empty(), true);
        assert_eq!(
            printer.as_str(),
            "struct EnumWindowsProc\n{\n    BOOL (CALLBACK * ptr)(LPVOID hwnd, LPVOID lParam);\n};"
        );

        let mut printer = TextCodePrinter::new();
        definition.print_forward_to(&mut printer, &mut LogMemoryPrinter::new());
        assert_eq!(printer.as_str(), "struct EnumWindowsProc;");
    }
}
