//! Dispatch trees
//!
//! An [`ExpansionContext`] is created for one function and holds the
//! expanded variants of each image position. Nothing in the function's
//! signature is touched; the context is dropped once the wrapper is lowered.

use pixgen_schema::{FunctionSignature, PixelType};

use crate::expand::{ConcreteVariant, VariantTable};

/// One image position: self first, then image parameters in order
#[derive(Debug, Clone)]
pub struct DispatchLevel {
    pub arg: String,
    pub variants: Vec<ConcreteVariant>,
}

#[derive(Debug, Clone)]
pub struct ExpansionContext {
    levels: Vec<DispatchLevel>,
    types_must_match: bool,
}

impl ExpansionContext {
    pub fn new(signature: &FunctionSignature, table: &VariantTable) -> Self {
        let levels = signature
            .image_positions()
            .into_iter()
            .filter_map(|arg| {
                let types = arg.dispatch_types()?;
                Some(DispatchLevel {
                    arg: arg.display_name().to_string(),
                    variants: table.expand(types),
                })
            })
            .collect();
        ExpansionContext {
            levels,
            types_must_match: signature.image_types_must_match(),
        }
    }

    pub fn levels(&self) -> &[DispatchLevel] {
        &self.levels
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// The branch structure, or `None` when no argument is an image
    pub fn tree(&self) -> Option<DispatchTree> {
        if self.levels.is_empty() {
            return None;
        }
        Some(DispatchTree {
            root: self.build_level(0, None, Vec::new()),
        })
    }

    fn build_level(
        &self,
        depth: usize,
        limit: Option<PixelType>,
        chosen: Vec<ConcreteVariant>,
    ) -> DispatchNode {
        let Some(level) = self.levels.get(depth) else {
            return DispatchNode::Leaf(chosen);
        };
        let cases = level
            .variants
            .iter()
            .filter(|v| limit.map_or(true, |t| v.pixel_type == t))
            .map(|variant| {
                let inner_limit = if self.types_must_match {
                    limit.or(Some(variant.pixel_type))
                } else {
                    None
                };
                let mut next = chosen.clone();
                next.push(variant.clone());
                (variant.clone(), self.build_level(depth + 1, inner_limit, next))
            })
            .collect();
        DispatchNode::Branch {
            level: depth,
            arg: level.arg.clone(),
            cases,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DispatchNode {
    Branch {
        level: usize,
        arg: String,
        cases: Vec<(ConcreteVariant, DispatchNode)>,
    },
    /// One concrete variant per image position, outermost first
    Leaf(Vec<ConcreteVariant>),
}

impl DispatchNode {
    fn depth(&self) -> usize {
        match self {
            DispatchNode::Leaf(_) => 0,
            DispatchNode::Branch { cases, .. } => {
                1 + cases.iter().map(|(_, n)| n.depth()).max().unwrap_or(0)
            }
        }
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a [ConcreteVariant]>) {
        match self {
            DispatchNode::Leaf(chosen) => out.push(chosen),
            DispatchNode::Branch { cases, .. } => {
                for (_, node) in cases {
                    node.collect_leaves(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchTree {
    pub root: DispatchNode,
}

impl DispatchTree {
    /// Number of nested branch levels on the deepest path
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn leaves(&self) -> Vec<&[ConcreteVariant]> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatch::*;
    use pixgen_schema::{ArgKind, Argument, FunctionDeclaration, NameAllocator, PixelTypeSet};

    fn image(name: Option<&str>, tags: &[&str]) -> Argument {
        let Ok(pixel_types) = PixelTypeSet::parse(tags) else {
            panic!("bad tags in test");
        };
        let Ok(arg) = Argument::new(
            name,
            ArgKind::Image {
                pixel_types,
                list: false,
            },
        ) else {
            panic!("bad image in test");
        };
        arg
    }

    fn signature(decl: FunctionDeclaration) -> FunctionSignature {
        let Ok(sig) = FunctionSignature::build(decl, &mut NameAllocator::new(), None) else {
            panic!("signature should build");
        };
        sig
    }

    #[test]
    fn test_self_and_one_param_give_two_levels() {
        let mut decl = FunctionDeclaration::new("mask");
        decl.self_type = Some(image(None, &["OneBit"]));
        decl.args = vec![image(Some("color"), &["RGB"])];
        let table = VariantTable::standard();
        let context = ExpansionContext::new(&signature(decl), &table);
        let Some(tree) = context.tree() else {
            panic!("image function should dispatch");
        };
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), table.variants_for(PixelType::OneBit).len());
        for leaf in tree.leaves() {
            assert_eq!(leaf.len(), 2);
            assert_eq!(&*leaf[1].name, "RGBImageView");
        }
    }

    #[test]
    fn test_depth_is_params_plus_one() {
        for n in 0..3 {
            let mut decl = FunctionDeclaration::new("combine");
            decl.self_type = Some(image(None, &["GreyScale", "Float"]));
            decl.args = (0..n)
                .map(|i| image(Some(&format!("other{}", i)), &["GreyScale"]))
                .collect();
            let context = ExpansionContext::new(&signature(decl), &VariantTable::standard());
            let Some(tree) = context.tree() else {
                panic!("image function should dispatch");
            };
            assert_eq!(tree.depth(), n + 1);
            assert_eq!(context.depth(), n + 1);
        }
    }

    #[test]
    fn test_no_images_means_no_tree() {
        let decl = FunctionDeclaration::new("version");
        let context = ExpansionContext::new(&signature(decl), &VariantTable::standard());
        assert!(context.tree().is_none());
        assert_eq!(context.depth(), 0);
    }

    #[test]
    fn test_matching_types_limit_inner_levels() {
        let mut decl = FunctionDeclaration::new("and_image");
        decl.self_type = Some(image(None, &["OneBit", "GreyScale"]));
        decl.args = vec![image(Some("other"), &["OneBit", "GreyScale"])];
        decl.image_types_must_match = true;
        let table = VariantTable::standard();
        let context = ExpansionContext::new(&signature(decl), &table);
        let Some(tree) = context.tree() else {
            panic!("image function should dispatch");
        };
        for leaf in tree.leaves() {
            assert_eq!(leaf[0].pixel_type, leaf[1].pixel_type);
        }
        // 5 x 5 OneBit combinations plus 1 x 1 GreyScale
        assert_eq!(tree.leaf_count(), 26);
    }
}
