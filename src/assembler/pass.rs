//! The three passes over a parsed program.
//!
//! 1. `calculate` gives every label its address.
//! 2. `preprocess` replaces label references with those addresses.
//! 3. `generate` encodes each statement to bytes.
//!
//! Each pass runs over the whole program before the next one starts, so
//! a label may be used before it is defined.
use super::ast::*;
use super::env::Environment;
use super::error::{Error, Result};
use super::isa;
use super::lexer::Location;

/// Assign addresses to labels, returning the address each statement
/// starts at.
pub fn calculate(ast: &[Statement], env: &mut Environment) -> Result<Vec<u32>> {
    let mut addresses = Vec::with_capacity(ast.len());
    for statement in ast {
        addresses.push(env.address());
        calculate_statement(statement, env)?;
    }
    Ok(addresses)
}

fn calculate_statement(statement: &Statement, env: &mut Environment) -> Result<()> {
    match statement {
        Statement::Label { name, location } => {
            if let Some(previous) = env.define(name) {
                warn!("{}: label `{}` redefined, was {:#05X}", location, name, previous);
            }
            Ok(())
        }
        Statement::Instruction { .. } => {
            env.next(2);
            Ok(())
        }
        Statement::Directive { name, args, location } => match name.as_str() {
            "org" => {
                let mut address = org_address(args, location)?;
                if address > 0x0FFF {
                    warn!("{}: `.org` address {:#X} does not fit in 12 bits and will be truncated", location, address);
                    address &= 0x0FFF;
                }
                if address < env.address() {
                    warn!("{}: `.org` moves backwards from {:#05X} to {:#05X}", location, env.address(), address);
                }
                env.set_address(address);
                Ok(())
            }
            "db" => {
                if args.is_empty() {
                    return Err(Error::semantic(location.clone(), "`.db` expects at least one byte"));
                }
                env.next(args.len() as u32);
                Ok(())
            }
            _ => Err(unknown_directive(name, location)),
        },
    }
}

/// The operand of `.org`, which must be a single literal address.
fn org_address(args: &[Argument], location: &Location) -> Result<u32> {
    match args {
        [arg] if arg.kind == ArgType::Address || arg.kind == ArgType::Byte => match &arg.value {
            Value::Number(n) => Ok(*n),
            Value::Identifier(id) => Err(Error::semantic(
                arg.location.clone(),
                format!("`.org` needs a literal address, `{}` is not known yet", id),
            )),
            Value::Null => Err(Error::semantic(arg.location.clone(), "`.org` needs a literal address")),
        },
        _ => Err(Error::semantic(location.clone(), "`.org` expects exactly one address")),
    }
}

fn unknown_directive(name: &str, location: &Location) -> Error {
    Error::semantic(location.clone(), format!("unknown directive `.{}` or wrong arguments", name))
}

/// Replace every identifier operand with the address bound to it.
pub fn preprocess(ast: &mut [Statement], env: &Environment) -> Result<()> {
    for statement in ast.iter_mut() {
        let args = match statement {
            Statement::Label { .. } => continue,
            Statement::Instruction { args, .. } | Statement::Directive { args, .. } => args,
        };

        for arg in args.iter_mut() {
            let address = match &arg.value {
                Value::Identifier(name) => match env.get(name) {
                    Some(address) => address,
                    None => {
                        return Err(Error::semantic(
                            arg.location.clone(),
                            format!("unknown identifier `{}`", name),
                        ));
                    }
                },
                _ => continue,
            };
            arg.value = Value::Number(address);
        }
    }
    Ok(())
}

/// Encode every statement, in order. The result has one entry per
/// statement; labels and `.org` produce empty entries.
pub fn generate(ast: &[Statement]) -> Result<Vec<Vec<u8>>> {
    ast.iter().map(generate_statement).collect()
}

fn generate_statement(statement: &Statement) -> Result<Vec<u8>> {
    match statement {
        Statement::Label { .. } => Ok(Vec::new()),
        Statement::Instruction { mnemonic, args, location } => {
            let opcode = isa::encode(mnemonic, args, location)?;
            Ok(opcode.to_be_bytes().to_vec())
        }
        Statement::Directive { name, args, location } => match name.as_str() {
            "org" => Ok(Vec::new()),
            "db" => args.iter()
                .map(|arg| {
                    if arg.kind != ArgType::Byte {
                        return Err(Error::semantic(arg.location.clone(), "`.db` accepts only byte values"));
                    }
                    Ok((isa::operand(arg)? & 0xFF) as u8)
                })
                .collect(),
            _ => Err(unknown_directive(name, location)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::error::ErrorKind;
    use super::super::lexer::tokenize;
    use super::super::parser::Parser;

    fn parse(text: &str) -> Vec<Statement> {
        Parser::new(tokenize("test", text).unwrap()).run().unwrap()
    }

    #[test]
    fn test_calculate() {
        let ast = parse("a:\ncls\nb:\n.db 1, 2, 3\nc:\n.org [#300]\nd:\nret\ne:");
        let mut env = Environment::new();
        let addresses = calculate(&ast, &mut env).unwrap();

        assert_eq!(addresses, vec![0, 0, 2, 2, 5, 5, 0x300, 0x300, 0x302]);
        assert_eq!(env.get("a"), Some(0));
        assert_eq!(env.get("b"), Some(2));
        assert_eq!(env.get("c"), Some(5));
        assert_eq!(env.get("d"), Some(0x300));
        assert_eq!(env.get("e"), Some(0x302));
        assert_eq!(env.address(), 0x302);
    }

    #[test]
    fn test_calculate_origin() {
        let ast = parse("cls\nhere:");
        let mut env = Environment::with_origin(0x200);
        calculate(&ast, &mut env).unwrap();
        assert_eq!(env.get("here"), Some(0x202));
    }

    #[test]
    fn test_calculate_directive_errors() {
        let mut env = Environment::new();
        let err = calculate(&parse(".org [later]\nlater:"), &mut env).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.location.column, 6);

        for text in &[".org", ".org 1, 2", ".org @1", ".db", ".dw 1", ".include 5"] {
            let err = calculate(&parse(text), &mut Environment::new()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Semantic, "{}", text);
            assert_eq!(err.location.column, 1, "{}", text);
        }
    }

    #[test]
    fn test_org_address_is_masked() {
        let ast = parse(".org #1300\nx:\n.org [#FFFFFFFF]\ncls\ny:");
        let mut env = Environment::new();
        calculate(&ast, &mut env).unwrap();
        assert_eq!(env.get("x"), Some(0x300));
        assert_eq!(env.get("y"), Some(0x1001));
    }

    #[test]
    fn test_duplicate_label_keeps_last() {
        let ast = parse("x:\ncls\nx:");
        let mut env = Environment::new();
        calculate(&ast, &mut env).unwrap();
        assert_eq!(env.get("x"), Some(2));
    }

    #[test]
    fn test_preprocess() {
        let mut ast = parse("jp [end]\nld @0, end\nend:");
        let mut env = Environment::new();
        calculate(&ast, &mut env).unwrap();
        preprocess(&mut ast, &env).unwrap();

        assert_eq!(ast[0].args()[0].value, Value::Number(4));
        assert_eq!(ast[0].args()[0].kind, ArgType::Address);
        assert_eq!(ast[1].args()[0].value, Value::Number(0));
        assert_eq!(ast[1].args()[1].value, Value::Number(4));
        assert_eq!(ast[1].args()[1].kind, ArgType::Byte);
    }

    #[test]
    fn test_preprocess_unknown_identifier() {
        let mut ast = parse("cls\n  jp [nowhere]");
        let mut env = Environment::new();
        calculate(&ast, &mut env).unwrap();
        let err = preprocess(&mut ast, &env).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.message, "unknown identifier `nowhere`");
        assert_eq!((err.location.line, err.location.column), (2, 6));
    }

    #[test]
    fn test_generate() {
        let ast = parse("start:\ncls\n.db 1, 2, #1FF\n.org [#300]\njp [#202]");
        let code = generate(&ast).unwrap();
        assert_eq!(code, vec![
            vec![],
            vec![0x00, 0xE0],
            vec![0x01, 0x02, 0xFF],
            vec![],
            vec![0x12, 0x02],
        ]);
    }

    #[test]
    fn test_generate_errors() {
        let err = generate(&parse(".db 1, @2")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.location.column, 8);

        let err = generate(&parse("ld 5, @0")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert_eq!(err.location.column, 1);

        // Unresolved operands never reach the encoder in a full run.
        assert!(generate(&parse("jp [start]")).is_err());
    }
}
