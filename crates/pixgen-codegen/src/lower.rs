//! Lowering of validated signatures into wrapper IR

use pixgen_schema::{
    naming, ArgKind, Argument, FunctionSignature, KindTag, PixelType, PluginModule,
};
use std::path::Path;
use tracing::trace;

use crate::dispatch::{DispatchNode, ExpansionContext};
use crate::errors::TemplateError;
use crate::expand::{ConcreteVariant, VariantTable};
use crate::ir::{
    CallArg, Dispatch, DispatchCase, Invocation, Slot, SlotId, SlotRole, Stmt, WrapperFunction,
    WrapperModule,
};

/// Lower every native function of a module. Fails on the first function
/// that cannot be expressed, before anything is rendered.
pub fn lower_module(
    module: &PluginModule,
    table: &VariantTable,
) -> Result<WrapperModule, TemplateError> {
    let functions = module
        .native_functions()
        .map(|f| lower_function(f, table))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WrapperModule {
        name: module.name.clone(),
        native_name: module.native_name(),
        declared_in: module
            .source
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned()),
        headers: module.cpp_headers.clone(),
        namespaces: module.cpp_namespaces.clone(),
        functions,
    })
}

/// Kind used to marshal an argument; image lists share one conversion
fn marshal_kind(arg: &Argument) -> KindTag {
    match arg.kind() {
        ArgKind::Image { list: true, .. } => KindTag::ImageList,
        _ => arg.tag(),
    }
}

fn slot(arg: &Argument, role: SlotRole) -> Slot {
    let name = arg.display_name();
    Slot {
        name: name.to_string(),
        symbol: naming::symbol(name),
        boundary: naming::boundary_symbol(name),
        kind: marshal_kind(arg),
        role,
    }
}

fn check_function(signature: &FunctionSignature) -> Result<(), TemplateError> {
    let function = signature.name().to_string();
    let has_self = signature.self_arg().is_some();

    if let Some(ret) = signature.return_arg() {
        match ret.kind() {
            ArgKind::Image { list: false, .. } if !signature.has_image_in_scope() => {
                return Err(TemplateError::ImageReturnWithoutInput { function });
            }
            ArgKind::Pixel { .. } if !has_self => {
                return Err(TemplateError::PixelReturnWithoutSelf { function });
            }
            ArgKind::Info => {
                return Err(TemplateError::UnsupportedReturn {
                    function,
                    kind: KindTag::Info.declared_as(),
                });
            }
            _ => {}
        }
    }
    if !has_self {
        if let Some(pixel) = signature.params().iter().find(|a| a.tag() == KindTag::Pixel) {
            return Err(TemplateError::PixelWithoutSelf {
                function,
                arg: pixel.display_name().to_string(),
            });
        }
    }
    Ok(())
}

struct Lowering<'a> {
    signature: &'a FunctionSignature,
    context: ExpansionContext,
    slots: Vec<Slot>,
    /// Input slots in call order, receiver first
    call_order: Vec<SlotId>,
    result: Option<SlotId>,
}

impl<'a> Lowering<'a> {
    fn new(signature: &'a FunctionSignature, table: &VariantTable) -> Self {
        let mut slots = Vec::new();
        let mut call_order = Vec::new();
        if let Some(receiver) = signature.self_arg() {
            slots.push(slot(receiver, SlotRole::Receiver));
            call_order.push(0);
        }
        for param in signature.params() {
            // Documentation-only arguments never cross the boundary
            if param.tag() == KindTag::Info {
                continue;
            }
            call_order.push(slots.len());
            slots.push(slot(param, SlotRole::Param));
        }
        let result = signature.return_arg().map(|ret| {
            slots.push(slot(ret, SlotRole::Result));
            slots.len() - 1
        });
        Lowering {
            signature,
            context: ExpansionContext::new(signature, table),
            slots,
            call_order,
            result,
        }
    }

    fn slot_named(&self, name: &str) -> Option<SlotId> {
        self.slots
            .iter()
            .position(|s| s.is_input() && s.name == name)
    }

    fn invocation(&self, chosen: &[ConcreteVariant]) -> Invocation {
        let receiver_type = self
            .signature
            .self_arg()
            .and_then(|_| chosen.first())
            .map(|v| v.pixel_type);
        let mut image_index = 0;
        let mut args = Vec::with_capacity(self.call_order.len() + 1);
        for &id in &self.call_order {
            let slot = &self.slots[id];
            let arg = match slot.kind {
                KindTag::Image => {
                    let variant = chosen.get(image_index).map(|v| v.name.clone());
                    image_index += 1;
                    match variant {
                        Some(variant) => CallArg::ImageView { slot: id, variant },
                        None => CallArg::Value(id),
                    }
                }
                KindTag::Pixel => CallArg::Pixel {
                    slot: id,
                    pixel_type: receiver_type.unwrap_or(PixelType::OneBit),
                },
                _ => CallArg::Value(id),
            };
            args.push(arg);
        }
        if let Some(caption) = self.signature.progress_bar() {
            args.push(CallArg::ProgressBar(caption.to_string()));
        }
        Invocation {
            function: self.signature.name().to_string(),
            args,
            result: self.result,
            pixel_result: self
                .signature
                .return_arg()
                .is_some_and(|r| r.tag() == KindTag::Pixel),
        }
    }

    fn lower_node(&self, node: &DispatchNode) -> Vec<Stmt> {
        match node {
            DispatchNode::Leaf(chosen) => vec![Stmt::Invoke(self.invocation(chosen))],
            DispatchNode::Branch { level, arg, cases } => {
                let Some(slot) = self.slot_named(arg) else {
                    return Vec::new();
                };
                let mut acceptable: Vec<PixelType> = cases.iter().map(|(v, _)| v.pixel_type).collect();
                if acceptable.is_empty() {
                    acceptable = self.context.levels()[*level]
                        .variants
                        .iter()
                        .map(|v| v.pixel_type)
                        .collect();
                }
                acceptable.dedup();
                vec![Stmt::Dispatch(Dispatch {
                    slot,
                    cases: cases
                        .iter()
                        .map(|(variant, next)| DispatchCase {
                            variant: variant.clone(),
                            body: self.lower_node(next),
                        })
                        .collect(),
                    acceptable,
                })]
            }
        }
    }

    fn finish(self) -> WrapperFunction {
        let mut body = vec![Stmt::ParseArgs];
        body.extend(
            self.slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_input())
                .map(|(id, _)| Stmt::Unmarshal(id)),
        );
        match self.context.tree() {
            Some(tree) => body.extend(self.lower_node(&tree.root)),
            None => body.push(Stmt::Invoke(self.invocation(&[]))),
        }
        body.extend(
            self.slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.owns_conversion())
                .map(|(id, _)| Stmt::Release(id)),
        );
        body.push(match self.result {
            Some(id) => Stmt::ReturnResult(id),
            None => Stmt::ReturnNone,
        });

        let name = self.signature.name().to_string();
        WrapperFunction {
            entry_point: format!("call_{}", name),
            name,
            slots: self.slots,
            body: vec![Stmt::Guarded(body)],
        }
    }
}

/// Lower one function into a wrapper
pub fn lower_function(
    signature: &FunctionSignature,
    table: &VariantTable,
) -> Result<WrapperFunction, TemplateError> {
    check_function(signature)?;
    let lowering = Lowering::new(signature, table);
    trace!(
        function = signature.name(),
        depth = lowering.context.depth(),
        "Lowering wrapper"
    );
    Ok(lowering.finish())
}
