//! Structured representation of generated wrappers
//!
//! Lowering decides what each wrapper must do; a [`crate::backend::Backend`]
//! decides how that reads in the target language.

use pixgen_schema::{KindTag, PixelType};
use serde::Serialize;
use std::sync::Arc;

use crate::expand::ConcreteVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotRole {
    Receiver,
    Param,
    Result,
}

/// A value crossing the boundary: the receiver, a parameter or the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// Declared name, used in messages
    pub name: String,
    /// Native local holding the converted value
    pub symbol: String,
    /// Boundary temporary holding the raw object
    pub boundary: String,
    /// Marshalling kind; list-typed images use [`KindTag::ImageList`]
    pub kind: KindTag,
    pub role: SlotRole,
}

impl Slot {
    pub fn is_input(&self) -> bool {
        self.role != SlotRole::Result
    }

    /// Input whose conversion allocates a native container the wrapper frees
    pub fn owns_conversion(&self) -> bool {
        self.is_input()
            && matches!(
                self.kind,
                KindTag::IntVector
                    | KindTag::FloatVector
                    | KindTag::ComplexVector
                    | KindTag::PointVector
            )
    }
}

/// Index into [`WrapperFunction::slots`]
pub type SlotId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallArg {
    /// Pass the converted local unchanged
    Value(SlotId),
    /// Image local cast to one concrete view type
    ImageView { slot: SlotId, variant: Arc<str> },
    /// Pixel object converted with the receiver's current pixel type
    Pixel { slot: SlotId, pixel_type: PixelType },
    /// Progress reporter with a caption
    ProgressBar(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<CallArg>,
    pub result: Option<SlotId>,
    /// Result is a pixel and must be boxed for the caller
    pub pixel_result: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchCase {
    pub variant: ConcreteVariant,
    pub body: Vec<Stmt>,
}

/// Branch on the runtime representation of one image slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub slot: SlotId,
    pub cases: Vec<DispatchCase>,
    /// Pixel types named in the error for an unmatched representation
    pub acceptable: Vec<PixelType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Stmt {
    /// Unpack the positional argument tuple into every input slot
    ParseArgs,
    /// Convert a boundary object into its native local, failing with a type
    /// error naming the argument and function
    Unmarshal(SlotId),
    /// Run the body; any native exception becomes a boundary error
    Guarded(Vec<Stmt>),
    Dispatch(Dispatch),
    Invoke(Invocation),
    /// Free a native local allocated during conversion. Error exits free
    /// every owned slot on their own.
    Release(SlotId),
    /// Convert the result back and return it
    ReturnResult(SlotId),
    ReturnNone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapperFunction {
    pub name: String,
    pub entry_point: String,
    pub slots: Vec<Slot>,
    pub body: Vec<Stmt>,
}

impl WrapperFunction {
    pub fn inputs(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|s| s.is_input())
    }

    /// Slots that must be freed on every exit, including error exits
    pub fn owned(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|s| s.owns_conversion())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapperModule {
    pub name: Arc<str>,
    /// Importable name of the native module, e.g. `_threshold`
    pub native_name: String,
    /// File name of the declaration, recorded in the generated header
    pub declared_in: Option<String>,
    pub headers: Vec<String>,
    pub namespaces: Vec<String>,
    pub functions: Vec<WrapperFunction>,
}
