use super::{optional_of, suspend, Ast, AstKind, Codec, PropertySignature, TransformationKind, TAG};

/// Derives a shape where every struct property and tuple element is optional,
/// recursively.
///
/// Rebuilt structs, declarations and transformations get a reference
/// annotation holding the original node's fingerprint. Nodes carrying a codec
/// also record the codec's address, so anonymous scalars stay distinct. Named
/// objects keep their identifier and get a partial surrogate, so they still
/// compile to the same GraphQL type name.
pub fn deep_partial(ast: &Ast) -> Ast {
    match ast.kind() {
        AstKind::TupleType { elements, rest } => Ast::with_annotations(
            AstKind::TupleType {
                elements: elements.iter().map(partial_optional).collect(),
                rest: rest.iter().map(partial_optional).collect(),
            },
            ast.annotations().clone(),
        ),
        AstKind::TypeLiteral {
            property_signatures,
        } => {
            let property_signatures = property_signatures
                .iter()
                .map(|property| {
                    if property.name == TAG {
                        return property.clone();
                    }
                    PropertySignature {
                        ty: optional_of(deep_partial(&property.value_type())),
                        is_optional: true,
                        ..property.clone()
                    }
                })
                .collect();
            let mut annotations = ast.annotations().clone();
            annotations.reference = Some(ast.fingerprint());
            Ast::with_annotations(
                AstKind::TypeLiteral {
                    property_signatures,
                },
                annotations,
            )
        }
        AstKind::Union { types } => Ast::with_annotations(
            AstKind::Union {
                types: types.iter().map(deep_partial).collect(),
            },
            ast.annotations().clone(),
        ),
        AstKind::Suspend(thunk) => {
            let thunk = thunk.clone();
            suspend(move || deep_partial(&thunk.force()))
        }
        AstKind::Declaration {
            type_parameters,
            codec,
        } => {
            let mut annotations = ast.annotations().clone();
            annotations.reference = Some(codec_reference(ast, codec));
            Ast::with_annotations(
                AstKind::Declaration {
                    type_parameters: type_parameters.iter().map(deep_partial).collect(),
                    codec: codec.clone(),
                },
                annotations,
            )
        }
        AstKind::Transformation {
            from,
            to,
            transformation,
        } => {
            let mut annotations = ast.annotations().clone();
            annotations.reference = Some(match transformation {
                TransformationKind::Final(codec) => codec_reference(ast, codec),
                TransformationKind::Composition => ast.fingerprint(),
            });
            if let Some(surrogate) = ast.surrogate_annotation() {
                annotations.surrogate = Some(deep_partial(surrogate));
            }
            Ast::with_annotations(
                AstKind::Transformation {
                    from: deep_partial(from),
                    to: deep_partial(to),
                    transformation: transformation.clone(),
                },
                annotations,
            )
        }
        AstKind::Refinement { .. }
        | AstKind::Keyword(_)
        | AstKind::Literal(_)
        | AstKind::Enums { .. } => ast.clone(),
    }
}

fn codec_reference(ast: &Ast, codec: &Codec) -> String {
    format!("{}:{}", ast.fingerprint(), codec.address())
}

fn partial_optional(element: &Ast) -> Ast {
    let inner = element.optional_member().unwrap_or(element);
    optional_of(deep_partial(inner))
}
