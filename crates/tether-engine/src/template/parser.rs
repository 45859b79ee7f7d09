//! Recursive-descent parser for template text.

use std::sync::Arc;

use crate::signature::{MemberKind, MemberSignature, Modifiers, PrimitiveType, TypeRef};
use crate::version::VersionTag;

use super::descriptor::{MemberDeclaration, TemplateDescriptor, VersionOverride};
use super::error::{SyntaxErrorKind, TemplateSyntaxError};
use super::lexer::Lexer;
use super::token::{Span, Token};

type ParseResult<T> = Result<T, TemplateSyntaxError>;

/// Deepest nesting of generic type arguments
pub(crate) const MAX_TYPE_DEPTH: usize = 32;

/// Where a type appears; `void` is only valid as a return type
#[derive(Clone, Copy, PartialEq, Eq)]
enum TypePosition {
    Return,
    Value,
}

/// The shape written after `->` in an override
struct OverrideTarget {
    return_type: Option<TypeRef>,
    name: String,
    params: Option<Vec<TypeRef>>,
    span: Span,
}

pub(crate) struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    type_params: Vec<Arc<str>>,
    type_depth: usize,
}

impl Parser {
    pub(crate) fn new(source: &str) -> ParseResult<Self> {
        Ok(Self {
            tokens: Lexer::new(source).tokenize()?,
            pos: 0,
            type_params: Vec::new(),
            type_depth: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].0
    }

    fn span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn advance(&mut self) -> (Token, Span) {
        let entry = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        entry
    }

    fn error_at(&self, kind: SyntaxErrorKind, span: Span) -> TemplateSyntaxError {
        TemplateSyntaxError::new(kind, span.line, span.column)
    }

    fn unexpected(&self, expected: &str) -> TemplateSyntaxError {
        let kind = match self.peek() {
            Token::Eof => SyntaxErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            },
            other => SyntaxErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: other.to_string(),
            },
        };
        self.error_at(kind, self.span())
    }

    fn expect(&mut self, token: Token) -> ParseResult<Span> {
        if *self.peek() == token {
            Ok(self.advance().1)
        } else {
            Err(self.unexpected(&format!("'{}'", token)))
        }
    }

    fn eat(&mut self, token: Token) -> bool {
        if *self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<(String, Span)> {
        match self.peek() {
            Token::Ident(_) => match self.advance() {
                (Token::Ident(name), span) => Ok((name, span)),
                _ => Err(self.unexpected(what)),
            },
            _ => Err(self.unexpected(what)),
        }
    }

    /// Parse a complete template
    pub(crate) fn parse_template(mut self) -> ParseResult<TemplateDescriptor> {
        self.expect(Token::Template)?;
        let (name, _) = self.expect_ident("template name")?;
        let simple_name = name.rsplit('.').next().unwrap_or(&name).to_string();

        if self.eat(Token::Less) {
            loop {
                let (param, span) = self.expect_ident("type parameter")?;
                if self.type_params.iter().any(|p| **p == *param) {
                    return Err(self.error_at(SyntaxErrorKind::DuplicateTypeParameter(param), span));
                }
                self.type_params.push(Arc::from(param.as_str()));
                if !self.eat(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::Greater)?;
        }

        let since = if self.eat(Token::Since) {
            self.expect(Token::LeftParen)?;
            let version = self.parse_version()?;
            self.expect(Token::RightParen)?;
            version
        } else {
            VersionTag::zero()
        };

        self.expect(Token::LeftBrace)?;
        let mut members: Vec<MemberDeclaration> = Vec::new();
        while *self.peek() != Token::RightBrace {
            let start = self.span();
            let member = self.parse_member(&name, &simple_name)?;
            if members.iter().any(|m| m.signature == member.signature) {
                return Err(self.error_at(SyntaxErrorKind::DuplicateMember(member.signature.to_string()), start));
            }
            members.push(member);
        }
        self.expect(Token::RightBrace)?;
        self.expect(Token::Eof)?;

        Ok(TemplateDescriptor::new(&name, self.type_params, since, members))
    }

    fn parse_version(&mut self) -> ParseResult<VersionTag> {
        match self.peek() {
            Token::Version(_) => {
                let (token, span) = self.advance();
                let text = token.to_string();
                VersionTag::parse(&text).map_err(|_| self.error_at(SyntaxErrorKind::InvalidVersion(text), span))
            }
            _ => Err(self.unexpected("version")),
        }
    }

    fn parse_member(&mut self, owner: &str, simple_name: &str) -> ParseResult<MemberDeclaration> {
        let mut modifiers = Modifiers::default();
        while let Token::Ident(word) = self.peek() {
            let mut next = modifiers;
            if !next.apply(word) {
                break;
            }
            modifiers = next;
            self.advance();
        }

        let mut signature = match (self.peek(), self.peek_at(1)) {
            (Token::Ident(_), Token::LeftParen) => {
                let (name, span) = self.expect_ident("constructor name")?;
                if name != simple_name {
                    return Err(self.error_at(
                        SyntaxErrorKind::ConstructorName {
                            expected: simple_name.to_string(),
                            found: name,
                        },
                        span,
                    ));
                }
                let params = self.parse_params()?;
                MemberSignature::constructor(TypeRef::named(owner), params)
            }
            _ => {
                let member_type = self.parse_type(TypePosition::Return)?;
                let (name, _) = self.expect_ident("member name")?;
                if *self.peek() == Token::LeftParen {
                    let params = self.parse_params()?;
                    MemberSignature::method(&name, params, member_type)
                } else {
                    if member_type.is_void() {
                        return Err(self.error_at(SyntaxErrorKind::VoidNotAllowed, self.span()));
                    }
                    MemberSignature::field(&name, member_type)
                }
            }
        };
        signature.is_static = modifiers.is_static;
        signature.is_optional = modifiers.is_optional;

        let mut overrides: Vec<VersionOverride> = Vec::new();
        while *self.peek() == Token::VersionAnnotation {
            let start = self.span();
            let version_override = self.parse_override(&signature, simple_name)?;
            match overrides.iter().find(|o| o.version == version_override.version) {
                Some(existing)
                    if existing.signature == version_override.signature
                        && existing.signature.name == version_override.signature.name => {}
                Some(_) => {
                    return Err(self.error_at(
                        SyntaxErrorKind::ConflictingOverride {
                            member: signature.to_string(),
                            version: version_override.version.to_string(),
                        },
                        start,
                    ))
                }
                None => overrides.push(version_override),
            }
        }
        overrides.sort_by(|a, b| a.version.cmp(&b.version));

        self.expect(Token::Semicolon)?;
        Ok(MemberDeclaration {
            signature,
            modifiers,
            overrides,
        })
    }

    fn parse_override(&mut self, base: &MemberSignature, simple_name: &str) -> ParseResult<VersionOverride> {
        self.expect(Token::VersionAnnotation)?;
        self.expect(Token::LeftParen)?;
        let version = self.parse_version()?;
        self.expect(Token::RightParen)?;
        self.expect(Token::Arrow)?;

        let target = self.parse_override_target()?;
        let mismatch = || SyntaxErrorKind::OverrideShapeMismatch {
            member: base.to_string(),
            version: version.to_string(),
        };

        let mut signature = match base.kind {
            MemberKind::Field => {
                if target.params.is_some() {
                    return Err(self.error_at(mismatch(), target.span));
                }
                let field_type = target.return_type.unwrap_or_else(|| base.return_type.clone());
                if field_type.is_void() {
                    return Err(self.error_at(SyntaxErrorKind::VoidNotAllowed, target.span));
                }
                MemberSignature::field(&target.name, field_type)
            }
            MemberKind::Method => {
                let Some(params) = target.params else {
                    return Err(self.error_at(mismatch(), target.span));
                };
                let return_type = target.return_type.unwrap_or_else(|| base.return_type.clone());
                MemberSignature::method(&target.name, params, return_type)
            }
            MemberKind::Constructor => {
                let (Some(params), None) = (target.params, &target.return_type) else {
                    return Err(self.error_at(mismatch(), target.span));
                };
                if target.name != simple_name {
                    return Err(self.error_at(
                        SyntaxErrorKind::ConstructorName {
                            expected: simple_name.to_string(),
                            found: target.name,
                        },
                        target.span,
                    ));
                }
                MemberSignature::constructor(base.return_type.clone(), params)
            }
        };
        signature.is_static = base.is_static;
        signature.is_optional = base.is_optional;

        Ok(VersionOverride { version, signature })
    }

    fn parse_override_target(&mut self) -> ParseResult<OverrideTarget> {
        let span = self.span();
        // `Type name` when a type precedes the name, otherwise just `name`
        let has_type = matches!(
            (self.peek(), self.peek_at(1)),
            (Token::Ident(_), Token::Ident(_) | Token::Less | Token::LeftBracket)
        );
        let return_type = if has_type {
            Some(self.parse_type(TypePosition::Return)?)
        } else {
            None
        };
        let (name, _) = self.expect_ident("member name")?;
        let params = if *self.peek() == Token::LeftParen {
            Some(self.parse_params()?)
        } else {
            None
        };
        Ok(OverrideTarget {
            return_type,
            name,
            params,
            span,
        })
    }

    fn parse_params(&mut self) -> ParseResult<Vec<TypeRef>> {
        self.expect(Token::LeftParen)?;
        let mut params = Vec::new();
        if self.eat(Token::RightParen) {
            return Ok(params);
        }
        loop {
            params.push(self.parse_type(TypePosition::Value)?);
            // Parameter names are optional and discarded
            if let Token::Ident(_) = self.peek() {
                self.advance();
            }
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RightParen)?;
        Ok(params)
    }

    fn parse_type(&mut self, position: TypePosition) -> ParseResult<TypeRef> {
        let (name, span) = self.expect_ident("type")?;

        let base = if let Some(primitive) = PrimitiveType::from_keyword(&name) {
            if primitive == PrimitiveType::Void && (position == TypePosition::Value || *self.peek() == Token::LeftBracket) {
                return Err(self.error_at(SyntaxErrorKind::VoidNotAllowed, span));
            }
            TypeRef::primitive(primitive)
        } else if self.type_params.iter().any(|p| **p == *name) {
            TypeRef::variable(&name)
        } else if name
            .rsplit('.')
            .next()
            .and_then(|segment| segment.chars().next())
            .is_some_and(|c| c.is_uppercase())
        {
            let args = if self.eat(Token::Less) {
                if self.type_depth >= MAX_TYPE_DEPTH {
                    return Err(self.error_at(SyntaxErrorKind::NestingTooDeep(MAX_TYPE_DEPTH), span));
                }
                self.type_depth += 1;
                let args = self.parse_type_args();
                self.type_depth -= 1;
                args?
            } else {
                Vec::new()
            };
            TypeRef::generic(&name, args)
        } else {
            return Err(self.error_at(SyntaxErrorKind::UnknownType(name), span));
        };

        let mut ty = base;
        while self.eat(Token::LeftBracket) {
            self.expect(Token::RightBracket)?;
            ty = TypeRef::array(ty);
        }
        Ok(ty)
    }

    fn parse_type_args(&mut self) -> ParseResult<Vec<TypeRef>> {
        let mut args = Vec::new();
        loop {
            args.push(self.parse_type(TypePosition::Value)?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::Greater)?;
        Ok(args)
    }

    /// Parse a standalone type (`int`, `List<String>`, `geo.Point[]`)
    pub(crate) fn parse_standalone_type(mut self) -> ParseResult<TypeRef> {
        let ty = self.parse_type(TypePosition::Return)?;
        self.expect(Token::Eof)?;
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseResult<TemplateDescriptor> {
        Parser::new(source)?.parse_template()
    }

    fn int() -> TypeRef {
        TypeRef::primitive(PrimitiveType::Int)
    }

    #[test]
    fn test_parse_members() {
        let t = parse(
            "template geo.Point @since(1.8) {
                int x;
                static final int ORIGIN;
                public int getX();
                void move(int dx, int dy);
                Point(int, int);
                optional String label();
            }",
        )
        .unwrap();

        assert_eq!(t.name(), "geo.Point");
        assert_eq!(t.since(), &VersionTag::parse("1.8").unwrap());
        assert_eq!(t.len(), 6);
        assert_eq!(t.members()[0].signature, MemberSignature::field("x", int()));
        assert!(t.members()[1].is_static());
        assert!(t.members()[1].modifiers.is_final);
        assert_eq!(t.members()[3].signature.arity(), 2);
        assert_eq!(t.members()[4].kind(), MemberKind::Constructor);
        assert_eq!(t.members()[4].signature.return_type, TypeRef::named("geo.Point"));
        assert!(t.members()[5].is_optional());
    }

    #[test]
    fn test_parse_overrides_sorted() {
        let t = parse(
            "template Point {
                int getX() @version(3.0) -> x() @version(2.0) -> getXCoord();
                int y @version(2.0) -> long yCoord;
            }",
        )
        .unwrap();
        let get_x = &t.members()[0];
        assert_eq!(get_x.overrides.len(), 2);
        assert_eq!(get_x.overrides[0].name(), "getXCoord");
        assert_eq!(get_x.overrides[1].name(), "x");
        assert_eq!(get_x.overrides[0].signature.return_type, int());

        let y = &t.members()[1];
        assert_eq!(y.overrides[0].signature.return_type, TypeRef::primitive(PrimitiveType::Long));
    }

    #[test]
    fn test_generic_template() {
        let t = parse("template Box<T> { T get(); void put(T value); java.util.List<T>[] all(); }").unwrap();
        assert_eq!(t.type_params().len(), 1);
        assert_eq!(t.members()[0].signature.return_type, TypeRef::variable("T"));
        assert_eq!(
            t.members()[2].signature.return_type,
            TypeRef::array(TypeRef::generic("java.util.List", vec![TypeRef::variable("T")]))
        );
    }

    #[test]
    fn test_unknown_type() {
        let err = parse("template A {\n  integer x;\n}").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnknownType("integer".to_string()));
        assert_eq!((err.line, err.column), (2, 3));
    }

    #[test]
    fn test_void_field_and_parameter() {
        assert_eq!(parse("template A { void x; }").unwrap_err().kind, SyntaxErrorKind::VoidNotAllowed);
        assert_eq!(
            parse("template A { int f(void v); }").unwrap_err().kind,
            SyntaxErrorKind::VoidNotAllowed
        );
    }

    #[test]
    fn test_duplicate_member() {
        let err = parse("template A { int f(int a); int f(int b); }").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::DuplicateMember(_)));
        // Overloads are fine
        assert!(parse("template A { int f(int a); int f(long a); }").is_ok());
    }

    #[test]
    fn test_conflicting_override() {
        let err = parse("template A { int f() @version(2) -> g() @version(2) -> h(); }").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::ConflictingOverride { .. }));
        // Identical overrides collapse
        let t = parse("template A { int f() @version(2) -> g() @version(2) -> g(); }").unwrap();
        assert_eq!(t.members()[0].overrides.len(), 1);
    }

    #[test]
    fn test_override_shape_mismatch() {
        let err = parse("template A { int x @version(2) -> y(); }").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::OverrideShapeMismatch { .. }));
        let err = parse("template A { int f() @version(2) -> g; }").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::OverrideShapeMismatch { .. }));
    }

    #[test]
    fn test_constructor_name() {
        let err = parse("template geo.Point { Vector(int); }").unwrap_err();
        assert_eq!(
            err.kind,
            SyntaxErrorKind::ConstructorName {
                expected: "Point".to_string(),
                found: "Vector".to_string()
            }
        );
    }

    #[test]
    fn test_premature_end() {
        let err = parse("template A { int x;").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedEof { .. }));
    }

    #[test]
    fn test_standalone_type() {
        let ty = Parser::new("Map<String, int>").unwrap().parse_standalone_type().unwrap();
        assert_eq!(ty, TypeRef::generic("Map", vec![TypeRef::string(), int()]));
        assert!(Parser::new("int x").unwrap().parse_standalone_type().is_err());
    }

    #[test]
    fn test_type_nesting_limit() {
        let nested = |depth: usize| format!("{}String{}", "List<".repeat(depth), ">".repeat(depth));

        assert!(Parser::new(&nested(MAX_TYPE_DEPTH)).unwrap().parse_standalone_type().is_ok());
        let err = Parser::new(&nested(MAX_TYPE_DEPTH + 1))
            .unwrap()
            .parse_standalone_type()
            .unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::NestingTooDeep(MAX_TYPE_DEPTH));

        let source = format!("template A {{ {} f(); }}", nested(10_000));
        assert!(matches!(parse(&source).unwrap_err().kind, SyntaxErrorKind::NestingTooDeep(_)));
    }
}
