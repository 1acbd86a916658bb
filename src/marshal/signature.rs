//! Native function signatures.
//!
//! A [`NativeSignature`] is the native prototype of a P/Invoke method, a COM interop method or
//! a delegate. Its parameters and return value are classified once on construction; printing
//! only renders the result.
//!
//! # Key Components
//!
//! - [`PInvokeMethod`] - Description of a method imported from a native library
//! - [`ComMethod`] - Description of a method of an imported COM interface
//! - [`NativeSignature`] - The classified prototype
//! - [`NativeParameter`] - One parameter of the prototype
//!
//! # Examples
//!
//! ```rust
//! use marshalscope::marshal::{
//!     Builtin, Classifier, DefinitionCache, MarshalFlags, NativeSignature, ParameterInfo,
//!     PInvokeMethod, TypeUniverse,
//! };
//! use marshalscope::output::{LogMemoryPrinter, PrintFlags, TextCodePrinter};
//!
//! let universe = TypeUniverse::new();
//! let mut cache = DefinitionCache::new();
//! let mut classifier = Classifier::new(&universe, &mut cache);
//!
//! let method = PInvokeMethod::new("Beep", universe.builtin(Builtin::Boolean))
//!     .with_param(ParameterInfo::new("frequency", universe.builtin(Builtin::UInt32)))
//!     .with_param(ParameterInfo::new("duration", universe.builtin(Builtin::UInt32)))
//!     .exact_spelling();
//! let signature = NativeSignature::from_pinvoke(&mut classifier, &method, MarshalFlags::PLATFORM_64BIT);
//!
//! let mut printer = TextCodePrinter::new();
//! signature.print_to(&mut printer, &mut LogMemoryPrinter::new(), PrintFlags::empty());
//! assert_eq!(printer.as_str(), "BOOL WINAPI Beep(UINT frequency, UINT duration);");
//! ```

use crate::{
    diagnostics::{Log, Message},
    marshal::{
        definitions::{DefHandle, DefinitionCache, DefinitionSet},
        descriptor::{DefaultValue, ParamAttributes, ParameterInfo, SiblingParameter},
        flags::MarshalFlags,
        ident::make_c_identifier,
        native::{Classifier, NativeType},
        typename::TypeName,
        universe::{Builtin, CallingConvention, CharSet, TypeKind, TypeRef},
    },
    output::{CodePrinter, LogPrinter, OutputType, PrintFlags},
};

/// A method imported from a native library.
#[derive(Debug, Clone, PartialEq)]
pub struct PInvokeMethod {
    /// Managed method name
    pub name: String,
    /// Exported name or `#ordinal`; the method name when `None`
    pub entry_point: Option<String>,
    /// Character set of string parameters
    pub char_set: CharSet,
    /// Calling convention
    pub calling_convention: CallingConvention,
    /// Disables the `A`/`W` suffix lookup
    pub exact_spelling: bool,
    /// The native function returns the managed return value directly
    pub preserve_sig: bool,
    /// Declared `static`
    pub is_static: bool,
    /// Declared `public`
    pub is_public: bool,
    /// Takes a variable argument list
    pub varargs: bool,
    /// Parameters in declaration order
    pub params: Vec<ParameterInfo>,
    /// Return value
    pub ret: ParameterInfo,
}

impl PInvokeMethod {
    /// Creates a static, non-public, signature-preserving import of `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, ret: TypeRef) -> Self {
        PInvokeMethod {
            name: name.into(),
            entry_point: None,
            char_set: CharSet::default(),
            calling_convention: CallingConvention::default(),
            exact_spelling: false,
            preserve_sig: true,
            is_static: true,
            is_public: false,
            varargs: false,
            params: Vec::new(),
            ret: ParameterInfo::returning(ret),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParameterInfo) -> Self {
        self.params.push(param);
        self
    }

    /// Replaces the return value description.
    #[must_use]
    pub fn with_return(mut self, ret: ParameterInfo) -> Self {
        self.ret = ret;
        self
    }

    /// Sets the exported name.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = Some(entry_point.into());
        self
    }

    /// Sets the character set.
    #[must_use]
    pub fn with_char_set(mut self, char_set: CharSet) -> Self {
        self.char_set = char_set;
        self
    }

    /// Sets the calling convention.
    #[must_use]
    pub fn with_calling_convention(mut self, calling_convention: CallingConvention) -> Self {
        self.calling_convention = calling_convention;
        self
    }

    /// Looks up the entry point by its exact name only.
    #[must_use]
    pub fn exact_spelling(mut self) -> Self {
        self.exact_spelling = true;
        self
    }

    /// Turns failure `HRESULT`s into exceptions; the native function returns `HRESULT`.
    #[must_use]
    pub fn hresult(mut self) -> Self {
        self.preserve_sig = false;
        self
    }

    /// Declares the method as an instance method.
    #[must_use]
    pub fn instance(mut self) -> Self {
        self.is_static = false;
        self
    }

    /// Declares the method as public.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    /// Appends a variable argument list.
    #[must_use]
    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }
}

/// A method of an imported COM interface.
#[derive(Debug, Clone, PartialEq)]
pub struct ComMethod {
    /// Method name
    pub name: String,
    /// String character set of the declaring interface
    pub char_set: CharSet,
    /// The native method returns the managed return value directly instead of an `HRESULT`
    pub preserve_sig: bool,
    /// Parameters in declaration order
    pub params: Vec<ParameterInfo>,
    /// Return value
    pub ret: ParameterInfo,
}

impl ComMethod {
    /// Creates a method with the `HRESULT` transformation applied.
    #[must_use]
    pub fn new(name: impl Into<String>, ret: TypeRef) -> Self {
        ComMethod {
            name: name.into(),
            char_set: CharSet::default(),
            preserve_sig: false,
            params: Vec::new(),
            ret: ParameterInfo::returning(ret),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParameterInfo) -> Self {
        self.params.push(param);
        self
    }

    /// Replaces the return value description.
    #[must_use]
    pub fn with_return(mut self, ret: ParameterInfo) -> Self {
        self.ret = ret;
        self
    }

    /// Sets the character set of the declaring interface.
    #[must_use]
    pub fn with_char_set(mut self, char_set: CharSet) -> Self {
        self.char_set = char_set;
        self
    }

    /// Keeps the managed return value as the native return value.
    #[must_use]
    pub fn preserve_sig(mut self) -> Self {
        self.preserve_sig = true;
        self
    }
}

/// A parameter of a [`NativeSignature`].
#[derive(Debug, Clone, PartialEq)]
pub struct NativeParameter {
    name: String,
    ty: Option<NativeType>,
    default_value: Option<DefaultValue>,
}

impl NativeParameter {
    fn ellipsis() -> Self {
        NativeParameter {
            name: "...".to_string(),
            ty: None,
            default_value: None,
        }
    }

    /// Parameter name; `...` for a variable argument list.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native type; `None` for a variable argument list.
    #[must_use]
    pub fn ty(&self) -> Option<&NativeType> {
        self.ty.as_ref()
    }

    /// Default value of an optional parameter.
    #[must_use]
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default_value.as_ref()
    }

    /// Prints the parameter; in plain C a default value becomes a comment.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
    ) {
        let Some(ty) = &self.ty else {
            printer.print(OutputType::Operator, &self.name);
            return;
        };

        ty.print_log(log_printer, &format!("Parameter {}", self.name));
        if flags.contains(PrintFlags::PRINT_MARSHAL_DIRECTION) {
            ty.print_marshal_direction(printer);
        }

        ty.print_to(printer, flags);
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Identifier, &self.name);
        ty.print_post_identifier_to(printer);

        if let Some(value) = &self.default_value {
            let literal = value.to_literal();
            if flags.contains(PrintFlags::USE_PLAIN_C) {
                let literal = literal.unwrap_or_else(|| "0".to_string());
                printer.print(OutputType::Other, " ");
                printer.print(OutputType::Comment, &format!("/* = {literal} */"));
            } else {
                printer.print(OutputType::Other, " ");
                printer.print(OutputType::Operator, "=");
                printer.print(OutputType::Other, " ");
                match literal {
                    Some(literal) => printer.print(OutputType::Literal, &literal),
                    None => printer.print(OutputType::Identifier, "NULL"),
                }
            }
        }
    }
}

/// The native prototype of a function or a function pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSignature {
    log: Log,
    function_pointer: bool,
    com: bool,
    name: String,
    calling_convention: CallingConvention,
    return_type: NativeType,
    parameters: Vec<NativeParameter>,
}

impl NativeSignature {
    fn empty(function_pointer: bool, com: bool, platform: MarshalFlags) -> Self {
        NativeSignature {
            log: Log::new(),
            function_pointer,
            com,
            name: String::new(),
            calling_convention: CallingConvention::default(),
            return_type: NativeType::primitive(TypeName::VOID, 0, platform.pointer_size()),
            parameters: Vec::new(),
        }
    }

    /// Classifies a P/Invoke method.
    ///
    /// Only [`MarshalFlags::ANSI_PLATFORM`] and [`MarshalFlags::PLATFORM_64BIT`] are taken from
    /// `platform`.
    pub fn from_pinvoke(
        classifier: &mut Classifier<'_>,
        method: &PInvokeMethod,
        platform: MarshalFlags,
    ) -> Self {
        let platform = platform & (MarshalFlags::ANSI_PLATFORM | MarshalFlags::PLATFORM_64BIT);
        let mut signature = Self::empty(false, false, platform);

        if !method.is_static {
            signature.log.add(Message::PInvokeIsNotStatic);
        }
        if method.is_public {
            signature.log.add(Message::PInvokeIsPublic);
        }

        signature.set_pinvoke_name(method);
        signature.calling_convention = method.calling_convention;

        let flags = platform | method.char_set.marshal_flags();
        signature.parameters = classify_parameters(classifier, &method.params, flags);

        if method.varargs {
            if method.calling_convention != CallingConvention::Cdecl {
                let convention: &'static str = method.calling_convention.into();
                signature
                    .log
                    .add(Message::VarargIsNotCdecl(convention.to_string()));
            }
            signature.parameters.push(NativeParameter::ellipsis());
        }

        if method.preserve_sig {
            signature.return_type = classifier.classify_parameter(
                &method.ret,
                Some(SiblingParameter::from_parameters(&method.params)),
                flags | MarshalFlags::RET_VAL_PARAM,
            );
        } else {
            signature.transform_hresult(classifier, &method.params, &method.ret, flags);
        }

        signature
    }

    /// Classifies a method of an imported COM interface.
    pub fn from_com_method(
        classifier: &mut Classifier<'_>,
        method: &ComMethod,
        platform: MarshalFlags,
    ) -> Self {
        let platform = platform & (MarshalFlags::ANSI_PLATFORM | MarshalFlags::PLATFORM_64BIT);
        let mut signature = Self::empty(false, true, platform);

        signature.name = make_c_identifier(&method.name);
        signature.calling_convention = CallingConvention::StdCall;

        let flags = platform | MarshalFlags::COM_INTEROP | method.char_set.marshal_flags();
        signature.parameters = classify_parameters(classifier, &method.params, flags);

        if method.preserve_sig {
            signature.return_type = classifier.classify_parameter(
                &method.ret,
                Some(SiblingParameter::from_parameters(&method.params)),
                flags,
            );
        } else {
            signature.transform_hresult(classifier, &method.params, &method.ret, flags);
        }

        signature
    }

    /// Classifies the `Invoke` method of a delegate as a function pointer.
    ///
    /// Parameters use the default P/Invoke marshaling no matter where the function pointer is
    /// passed to.
    pub fn from_delegate(classifier: &mut Classifier<'_>, ty: TypeRef, platform: MarshalFlags) -> Self {
        let universe = classifier.universe();
        let platform = platform & (MarshalFlags::ANSI_PLATFORM | MarshalFlags::PLATFORM_64BIT);
        let mut signature = Self::empty(true, false, platform);
        signature.name = universe.c_name(ty);

        let delegate = match universe.kind(ty) {
            TypeKind::Delegate(delegate) => Some(delegate),
            _ => None,
        };

        let mut flags = platform | MarshalFlags::CALLBACK_PARAM;
        match delegate.and_then(|delegate| delegate.function_pointer) {
            Some(attribute) => {
                signature.calling_convention = attribute.calling_convention;
                flags |= attribute.char_set.marshal_flags();
            }
            None => flags |= MarshalFlags::ANSI_STRINGS,
        }

        match delegate.and_then(|delegate| delegate.invoke.as_ref()) {
            Some(invoke) => {
                signature.parameters = classify_parameters(classifier, &invoke.params, flags);
                signature.return_type = classifier.classify_parameter(
                    &invoke.ret,
                    Some(SiblingParameter::from_parameters(&invoke.params)),
                    flags,
                );
            }
            None => {
                signature.log.add(Message::NonSpecificDelegateUsed(
                    universe.get(ty).name().to_string(),
                ));
                signature.return_type =
                    NativeType::primitive(TypeName::I4, 0, platform.pointer_size());
            }
        }

        signature
    }

    /// Replaces the return value with `HRESULT`, appending a non-void managed return value as
    /// an `[out]` parameter named `retVal`.
    fn transform_hresult(
        &mut self,
        classifier: &mut Classifier<'_>,
        params: &[ParameterInfo],
        ret: &ParameterInfo,
        flags: MarshalFlags,
    ) {
        self.return_type = NativeType::primitive(TypeName::ERROR, 0, flags.pointer_size());

        if !classifier.universe().is_builtin(ret.ty, Builtin::Void) {
            let mut ret_val = ret.clone().by_ref().with_attributes(ParamAttributes::OUT);
            ret_val.name = "retVal".to_string();

            let ty = classifier.classify_parameter(
                &ret_val,
                Some(SiblingParameter::from_parameters(params)),
                flags,
            );
            self.parameters.push(NativeParameter {
                name: ret_val.name,
                ty: Some(ty),
                default_value: ret_val.default_value,
            });
        }
    }

    fn set_pinvoke_name(&mut self, method: &PInvokeMethod) {
        let entry_point = method.entry_point.as_deref().unwrap_or(&method.name);

        let ordinal = entry_point.strip_prefix('#');
        self.name = match ordinal {
            Some(ordinal) => format!("Ordinal_{ordinal}"),
            None => entry_point.to_string(),
        };

        if method.exact_spelling || ordinal.is_some() {
            return;
        }

        // the runtime may also probe the A or W variant of the entry point
        match method.char_set {
            CharSet::None | CharSet::Ansi => {
                let ansi = format!("{}A", self.name);
                self.log
                    .add(Message::PossibleAltNameLookup(ansi, self.name.clone()));
            }
            CharSet::Unicode => {
                let wide = format!("{}W", self.name);
                self.log
                    .add(Message::PossibleAltNameLookup(self.name.clone(), wide.clone()));
                self.name = wide;
            }
            CharSet::Auto => {
                let ansi = format!("{}A", self.name);
                let wide = format!("{}W", self.name);
                self.log.add(Message::PossibleAutoAltNameLookup(ansi, wide));
            }
        }
    }

    /// Function name, or the typedef name of a function pointer.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calling convention.
    #[must_use]
    pub fn calling_convention(&self) -> CallingConvention {
        self.calling_convention
    }

    /// Native return type.
    #[must_use]
    pub fn return_type(&self) -> &NativeType {
        &self.return_type
    }

    /// Native parameters, including a trailing `retVal` or `...`.
    #[must_use]
    pub fn parameters(&self) -> &[NativeParameter] {
        &self.parameters
    }

    /// Returns true for delegate signatures.
    #[must_use]
    pub fn is_function_pointer(&self) -> bool {
        self.function_pointer
    }

    /// Diagnostics of the signature itself.
    #[must_use]
    pub fn log(&self) -> &Log {
        &self.log
    }

    /// Returns true if the signature or any of its parts logged an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.log.has_errors()
            || self.return_type.log().has_errors()
            || self
                .parameters
                .iter()
                .filter_map(NativeParameter::ty)
                .any(|ty| ty.log().has_errors())
    }

    /// Prints the prototype, `ret conv name(params);` or `ret (conv * name)(params);`.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
    ) {
        self.print_as(printer, log_printer, flags, &self.name);
    }

    /// Prints the prototype under another name.
    pub fn print_as(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
        name: &str,
    ) {
        let prefix = if self.function_pointer {
            format!("Function pointer {name}")
        } else {
            format!("Function {name}")
        };
        self.log.print_to(log_printer, &prefix);
        self.return_type.print_log(log_printer, "Return value");

        self.return_type.print_to(printer, flags);
        printer.print(OutputType::Other, " ");

        if self.function_pointer {
            printer.print(OutputType::Operator, "(");
        }
        self.print_calling_convention(printer, flags);
        printer.print(OutputType::Other, " ");

        if self.function_pointer {
            printer.print(OutputType::Operator, "*");
            printer.print(OutputType::Other, " ");
            printer.print(OutputType::TypeName, name);
            printer.print(OutputType::Operator, ")");
        } else {
            printer.print(OutputType::Identifier, name);
        }

        printer.print(OutputType::Operator, "(");
        if self.parameters.is_empty() {
            if flags.contains(PrintFlags::USE_PLAIN_C) {
                printer.print(OutputType::Keyword, "void");
            }
        } else {
            for (position, parameter) in self.parameters.iter().enumerate() {
                if position > 0 {
                    printer.print(OutputType::Operator, ",");
                    printer.print(OutputType::Other, " ");
                }
                parameter.print_to(printer, log_printer, flags);
            }
        }
        printer.print(OutputType::Operator, ");");
    }

    fn print_calling_convention(&self, printer: &mut dyn CodePrinter, flags: PrintFlags) {
        let plain_c = flags.contains(PrintFlags::USE_PLAIN_C);
        let (output_type, keyword) = match self.calling_convention {
            CallingConvention::Cdecl => (OutputType::Keyword, "__cdecl"),
            CallingConvention::FastCall => (OutputType::Keyword, "__fastcall"),
            CallingConvention::ThisCall => (OutputType::Keyword, "__thiscall"),
            CallingConvention::StdCall if self.com && !plain_c => {
                (OutputType::TypeName, "STDMETHODCALLTYPE")
            }
            CallingConvention::StdCall => (OutputType::Keyword, "__stdcall"),
            CallingConvention::Winapi if plain_c => (OutputType::Keyword, "__stdcall"),
            CallingConvention::Winapi if self.function_pointer => (OutputType::Keyword, "CALLBACK"),
            CallingConvention::Winapi => (OutputType::Keyword, "WINAPI"),
        };
        printer.print(output_type, keyword);
    }

    /// Adds the definitions the return value and the parameters depend on to `set`.
    pub fn collect_definitions(
        &self,
        cache: &DefinitionCache,
        set: &mut DefinitionSet,
        parent: Option<DefHandle>,
    ) {
        self.return_type.collect_definitions(cache, set, parent);
        for ty in self.parameters.iter().filter_map(NativeParameter::ty) {
            ty.collect_definitions(cache, set, parent);
        }
    }

    /// Collects every definition the signature depends on, directly or indirectly.
    #[must_use]
    pub fn definition_set(&self, cache: &DefinitionCache) -> DefinitionSet {
        let mut set = DefinitionSet::new();
        self.collect_definitions(cache, &mut set, None);
        set
    }
}

fn classify_parameters(
    classifier: &mut Classifier<'_>,
    params: &[ParameterInfo],
    flags: MarshalFlags,
) -> Vec<NativeParameter> {
    let siblings = SiblingParameter::from_parameters(params);

    params
        .iter()
        .enumerate()
        .map(|(position, param)| {
            let mut name = make_c_identifier(&param.name);
            if param.name.is_empty() {
                name = format!("arg{position}");
            }

            NativeParameter {
                name,
                ty: Some(classifier.classify_parameter(param, Some(siblings.clone()), flags)),
                default_value: param.default_value.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagnostics::MessageCode,
        marshal::universe::{DelegateType, TypeUniverse},
        output::{LogMemoryPrinter, TextCodePrinter},
        test::add_callback,
    };

    fn render(signature: &NativeSignature, flags: PrintFlags) -> String {
        let mut printer = TextCodePrinter::new();
        signature.print_to(&mut printer, &mut LogMemoryPrinter::new(), flags);
        printer.into_string()
    }

    #[test]
    fn test_pinvoke_unicode_name() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let method = PInvokeMethod::new("SetWindowText", universe.builtin(Builtin::Boolean))
            .with_char_set(CharSet::Unicode)
            .with_param(ParameterInfo::new("hWnd", universe.builtin(Builtin::IntPtr)))
            .with_param(ParameterInfo::new("text", universe.builtin(Builtin::String)));
        let signature = NativeSignature::from_pinvoke(&mut classifier, &method, MarshalFlags::empty());

        assert_eq!(signature.name(), "SetWindowTextW");
        assert!(signature.log().contains(MessageCode::PossibleAltNameLookup));
        assert_eq!(
            render(&signature, PrintFlags::empty()),
            "BOOL WINAPI SetWindowTextW(LPVOID hWnd, LPCWSTR text);"
        );
        assert_eq!(
            render(&signature, PrintFlags::USE_PLAIN_C),
            "int __stdcall SetWindowTextW(void * hWnd, const wchar_t * text);"
        );
    }

    #[test]
    fn test_pinvoke_ordinal() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let method = PInvokeMethod::new("Export", universe.builtin(Builtin::Void)).with_entry_point("#12");
        let signature = NativeSignature::from_pinvoke(&mut classifier, &method, MarshalFlags::empty());

        assert_eq!(signature.name(), "Ordinal_12");
        assert!(signature.log().is_empty());
        assert_eq!(render(&signature, PrintFlags::empty()), "VOID WINAPI Ordinal_12();");
        assert_eq!(render(&signature, PrintFlags::USE_PLAIN_C), "void __stdcall Ordinal_12(void);");
    }

    #[test]
    fn test_pinvoke_checks() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let method = PInvokeMethod::new("printf", universe.builtin(Builtin::Int32))
            .exact_spelling()
            .instance()
            .public()
            .varargs();
        let signature = NativeSignature::from_pinvoke(&mut classifier, &method, MarshalFlags::empty());

        assert!(signature.log().contains(MessageCode::PInvokeIsNotStatic));
        assert!(signature.log().contains(MessageCode::PInvokeIsPublic));
        assert!(signature.log().contains(MessageCode::VarargIsNotCdecl));
        assert!(signature.has_errors());
        assert_eq!(render(&signature, PrintFlags::empty()), "INT WINAPI printf(...);");
    }

    #[test]
    fn test_hresult_transformation() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let method = ComMethod::new("GetCount", universe.builtin(Builtin::Int32));
        let signature = NativeSignature::from_com_method(&mut classifier, &method, MarshalFlags::empty());

        assert_eq!(signature.parameters().len(), 1);
        assert_eq!(signature.parameters()[0].name(), "retVal");
        assert_eq!(
            render(&signature, PrintFlags::empty()),
            "HRESULT STDMETHODCALLTYPE GetCount(LPINT retVal);"
        );
        assert_eq!(
            render(&signature, PrintFlags::PRINT_MARSHAL_DIRECTION),
            "HRESULT STDMETHODCALLTYPE GetCount(/*[out]*/ LPINT retVal);"
        );
    }

    #[test]
    fn test_default_values() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let method = PInvokeMethod::new("Wait", universe.builtin(Builtin::Void))
            .exact_spelling()
            .with_param(
                ParameterInfo::new("timeout", universe.builtin(Builtin::Int32)).with_default(DefaultValue::Int(-1)),
            );
        let signature = NativeSignature::from_pinvoke(&mut classifier, &method, MarshalFlags::empty());

        assert_eq!(render(&signature, PrintFlags::empty()), "VOID WINAPI Wait(INT timeout = -1);");
        assert_eq!(
            render(&signature, PrintFlags::USE_PLAIN_C),
            "void __stdcall Wait(int timeout /* = -1 */);"
        );
    }

    #[test]
    fn test_unnamed_parameters() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let method = PInvokeMethod::new("Add", universe.builtin(Builtin::Int32))
            .exact_spelling()
            .with_calling_convention(CallingConvention::Cdecl)
            .with_param(ParameterInfo::new("", universe.builtin(Builtin::Int32)))
            .with_param(ParameterInfo::new("", universe.builtin(Builtin::Int32)));
        let signature = NativeSignature::from_pinvoke(&mut classifier, &method, MarshalFlags::empty());

        assert_eq!(render(&signature, PrintFlags::empty()), "INT __cdecl Add(INT arg0, INT arg1);");
    }

    #[test]
    fn test_delegate_signature() {
        let universe = TypeUniverse::new();
        let callback = add_callback(&universe);
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let signature = NativeSignature::from_delegate(&mut classifier, callback, MarshalFlags::empty());
        assert!(signature.is_function_pointer());
        assert_eq!(
            render(&signature, PrintFlags::empty()),
            "BOOL (CALLBACK * EnumWindowsProc)(LPVOID hwnd, LPVOID lParam);"
        );
    }

    #[test]
    fn test_non_specific_delegate() {
        let universe = TypeUniverse::new();
        let ty = universe
            .add("Contoso", "Untyped", TypeKind::Delegate(DelegateType::default()))
            .unwrap();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let signature = NativeSignature::from_delegate(&mut classifier, ty, MarshalFlags::empty());
        assert!(signature.log().contains(MessageCode::NonSpecificDelegateUsed));
        assert_eq!(render(&signature, PrintFlags::empty()), "INT (CALLBACK * Untyped)();");
    }
}
