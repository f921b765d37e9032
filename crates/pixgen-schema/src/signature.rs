//! Function metadata: declarations and validated signatures

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

use crate::args::{ArgKind, Argument};
use crate::errors::SignatureError;
use crate::kinds::ArgValue;
use crate::naming::{is_identifier, normalize_name, symbol, NameAllocator};
use crate::pixel::{PixelType, PixelTypeSet};

/// Name given to the receiver argument
pub const SELF_NAME: &str = "self";
/// Name given to the return argument
pub const RETURN_NAME: &str = "return";

const RESERVED_NAMES: [&str; 2] = [SELF_NAME, RETURN_NAME];

/// One documented example call: the receiver's pixel type and the remaining
/// argument values in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocExample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_type: Option<PixelType>,
    #[serde(default)]
    pub args: Vec<ArgValue>,
}

/// A function as written by the plugin author, before validation
#[derive(Debug, Clone, Default)]
pub struct FunctionDeclaration {
    pub name: String,
    pub self_type: Option<Argument>,
    pub args: Vec<Argument>,
    pub return_type: Option<Argument>,
    pub category: Option<String>,
    pub doc: Option<String>,
    pub author: Option<String>,
    pub examples: Vec<DocExample>,
    pub image_types_must_match: bool,
    pub progress_bar: Option<String>,
    pub pure: bool,
}

impl FunctionDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionDeclaration {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A validated function description shared by the generator and the
/// documentation renderer. Every argument carries a unique name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSignature {
    name: Arc<str>,
    self_arg: Option<Argument>,
    params: Vec<Argument>,
    return_arg: Option<Argument>,
    category: Option<String>,
    doc: Option<String>,
    author: Option<String>,
    examples: Vec<DocExample>,
    image_types_must_match: bool,
    progress_bar: Option<String>,
    pure: bool,
}

impl FunctionSignature {
    /// Validate a declaration and assign final argument names.
    ///
    /// Unnamed parameters draw synthetic names from `names`. The function's
    /// own category wins over `module_category`.
    pub fn build(
        decl: FunctionDeclaration,
        names: &mut NameAllocator,
        module_category: Option<&str>,
    ) -> Result<Self, SignatureError> {
        let function = decl.name.clone();
        if !is_identifier(&function) {
            return Err(SignatureError::InvalidName { function });
        }

        let self_arg = match decl.self_type {
            Some(arg) => Some(check_self(&function, &arg)?.renamed(SELF_NAME)),
            None => None,
        };

        let last = decl.args.len().saturating_sub(1);
        let mut seen = BTreeSet::new();
        let mut params = Vec::with_capacity(decl.args.len());
        for (position, arg) in decl.args.iter().enumerate() {
            let name = match arg.name() {
                Some(name) => normalize_name(name),
                None => names.allocate(),
            };
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(SignatureError::ReservedName { function, name });
            }
            if !is_identifier(&symbol(&name)) {
                return Err(SignatureError::InvalidArgumentName { function, name });
            }
            if arg.is_variadic() && position != last {
                return Err(SignatureError::NonFinalVariadic {
                    function,
                    arg: name,
                });
            }
            if !seen.insert(name.clone()) {
                return Err(SignatureError::DuplicateArgument { function, name });
            }
            params.push(arg.renamed(&name));
        }

        let return_arg = decl.return_type.map(|arg| arg.renamed(RETURN_NAME));
        let category = decl
            .category
            .or_else(|| module_category.map(str::to_string));

        let signature = FunctionSignature {
            name: Arc::from(function.as_str()),
            self_arg,
            params,
            return_arg,
            category,
            doc: decl.doc.filter(|doc| !doc.trim().is_empty()),
            author: decl.author,
            examples: decl.examples,
            image_types_must_match: decl.image_types_must_match,
            progress_bar: decl.progress_bar,
            pure: decl.pure,
        };
        signature.check_examples()?;
        trace!(function = %signature.name, params = signature.params.len(), "Built signature");
        Ok(signature)
    }

    fn check_examples(&self) -> Result<(), SignatureError> {
        for (index, example) in self.examples.iter().enumerate() {
            let invalid = |reason: String| SignatureError::InvalidExample {
                function: self.name.to_string(),
                index,
                reason,
            };
            match (self.self_types(), example.self_type) {
                (Some(allowed), Some(pixel_type)) if !allowed.contains(pixel_type) => {
                    return Err(invalid(format!(
                        "receiver pixel type {} is not one of {}",
                        pixel_type, allowed
                    )));
                }
                (None, Some(pixel_type)) => {
                    return Err(invalid(format!(
                        "receiver pixel type {} given but the function has no self argument",
                        pixel_type
                    )));
                }
                (Some(_), None) => {
                    return Err(invalid("missing receiver pixel type".to_string()));
                }
                _ => {}
            }
            if example.args.len() > self.params.len() {
                return Err(invalid(format!(
                    "{} values given for {} parameters",
                    example.args.len(),
                    self.params.len()
                )));
            }
            for (param, value) in self.params.iter().zip(&example.args) {
                param
                    .validate(value)
                    .map_err(|err| invalid(err.to_string()))?;
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn self_arg(&self) -> Option<&Argument> {
        self.self_arg.as_ref()
    }

    /// Pixel types accepted by the receiver
    pub fn self_types(&self) -> Option<&PixelTypeSet> {
        self.self_arg.as_ref().and_then(Argument::dispatch_types)
    }

    pub fn params(&self) -> &[Argument] {
        &self.params
    }

    pub fn return_arg(&self) -> Option<&Argument> {
        self.return_arg.as_ref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn examples(&self) -> &[DocExample] {
        &self.examples
    }

    pub fn image_types_must_match(&self) -> bool {
        self.image_types_must_match
    }

    pub fn progress_bar(&self) -> Option<&str> {
        self.progress_bar.as_deref()
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    /// Arguments that branch on pixel type: self first, then image
    /// parameters in declaration order
    pub fn image_positions(&self) -> Vec<&Argument> {
        self.self_arg
            .iter()
            .chain(self.params.iter())
            .filter(|arg| arg.dispatch_types().is_some())
            .collect()
    }

    /// Whether an image argument is available to type an image result
    pub fn has_image_in_scope(&self) -> bool {
        !self.image_positions().is_empty()
    }
}

fn check_self<'a>(function: &str, arg: &'a Argument) -> Result<&'a Argument, SignatureError> {
    match arg.kind() {
        ArgKind::Image { list: false, .. } if !arg.is_variadic() => Ok(arg),
        _ => Err(SignatureError::InvalidSelfType {
            function: function.to_string(),
            found: arg.describe(false),
        }),
    }
}
