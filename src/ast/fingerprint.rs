use std::fmt::Write;

use sha2::{Digest, Sha256};

use super::{Ast, AstKind, TransformationKind};

impl Ast {
    /// SHA-256 hex digest of the node's structure. Suspended nodes are not
    /// expanded, so self-referential shapes hash in finite time.
    pub fn fingerprint(&self) -> String {
        let mut description = String::new();
        describe(self, &mut description);
        hex::encode(Sha256::digest(description.as_bytes()))
    }
}

fn describe(ast: &Ast, out: &mut String) {
    let annotations = ast.annotations();
    out.push_str(ast.kind_name());
    if let Some(id) = &annotations.identifier {
        let _ = write!(out, "#{}", id);
    }
    for brand in &annotations.brands {
        let _ = write!(out, "@{}", brand);
    }
    if annotations.integer {
        out.push_str("@int");
    }

    out.push('(');
    match ast.kind() {
        AstKind::Keyword(_) | AstKind::Suspend(_) => {}
        AstKind::Literal(value) => {
            let _ = write!(out, "{}", value);
        }
        AstKind::Refinement { from, .. } => describe(from, out),
        AstKind::Transformation {
            from,
            to,
            transformation,
        } => {
            describe(from, out);
            out.push_str(match transformation {
                TransformationKind::Final(_) => "=>",
                TransformationKind::Composition => "->",
            });
            describe(to, out);
        }
        AstKind::TypeLiteral {
            property_signatures,
        } => {
            for property in property_signatures {
                let _ = write!(
                    out,
                    "{}{}:",
                    property.name,
                    if property.is_optional { "?" } else { "" }
                );
                describe(&property.ty, out);
                out.push(',');
            }
        }
        AstKind::TupleType { elements, rest } => {
            for element in elements {
                describe(element, out);
                out.push(',');
            }
            out.push_str("...");
            for element in rest {
                describe(element, out);
                out.push(',');
            }
        }
        AstKind::Union { types } => {
            for member in types {
                describe(member, out);
                out.push('|');
            }
        }
        AstKind::Enums { enums } => {
            for (key, value) in enums {
                let _ = write!(out, "{}={},", key, value);
            }
        }
        AstKind::Declaration {
            type_parameters, ..
        } => {
            for parameter in type_parameters {
                describe(parameter, out);
                out.push(',');
            }
        }
    }
    out.push(')');
}
