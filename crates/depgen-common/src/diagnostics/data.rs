//! Diagnostic code and message table.
//!
//! Codes are part of the host contract: never renumber an existing entry.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    // Syntax (01xx)
    pub const TOKEN_EXPECTED: u32 = 101;
    pub const UNEXPECTED_TOKEN: u32 = 102;
    pub const UNTERMINATED_STRING_LITERAL: u32 = 103;
    pub const UNTERMINATED_COMMENT: u32 = 104;
    pub const DECLARATION_NESTING_TOO_DEEP: u32 = 105;

    // Symbol resolution (1xxx)
    pub const CANNOT_RESOLVE_TYPE: u32 = 1001;
    pub const CANNOT_RESOLVE_BASE_TYPE: u32 = 1002;
    pub const AMBIGUOUS_TYPE_REFERENCE: u32 = 1003;
    pub const CONFLICTING_PARTIAL_BASE_CLASSES: u32 = 1004;
    pub const CIRCULAR_BASE_TYPE: u32 = 1006;

    // Classification (2xxx)
    pub const MEMBER_RESOLVED_AND_CACHED: u32 = 2001;
    pub const RESOLVED_PROPERTY_WITHOUT_SETTER: u32 = 2002;
    pub const RESOLVED_FIELD_READONLY: u32 = 2003;
    pub const LOADER_MUST_RETURN_VOID: u32 = 2004;
    pub const LOADER_CANNOT_BE_GENERIC: u32 = 2005;
    pub const LOADER_PARAMETER_BY_REFERENCE: u32 = 2006;
    pub const CACHED_TYPE_NOT_IMPLEMENTED: u32 = 2007;
    pub const ATTRIBUTE_INVALID_TARGET: u32 = 2008;
    pub const DUPLICATE_MEMBER: u32 = 2009;
    pub const RESOLVED_MEMBER_OF_OWN_TYPE: u32 = 2010;
    pub const STATIC_MEMBER_NOT_ALLOWED: u32 = 2011;

    // Emission prerequisites (3xxx)
    pub const CANDIDATE_MUST_BE_PARTIAL: u32 = 3001;
    pub const CONTAINING_TYPE_MUST_BE_PARTIAL: u32 = 3002;

    // Internal (9xxx)
    pub const INTERNAL_EMIT_ERROR: u32 = 9001;
}

pub mod diagnostic_messages {
    pub const TOKEN_EXPECTED: &str = "'{0}' expected.";
    pub const UNEXPECTED_TOKEN: &str = "Unexpected token '{0}'.";
    pub const UNTERMINATED_STRING_LITERAL: &str = "Unterminated string literal.";
    pub const UNTERMINATED_COMMENT: &str = "Unterminated comment.";
    pub const DECLARATION_NESTING_TOO_DEEP: &str =
        "Declarations are nested too deeply; the remaining body is skipped.";

    pub const CANNOT_RESOLVE_TYPE: &str = "Cannot resolve type '{0}'.";
    pub const CANNOT_RESOLVE_BASE_TYPE: &str = "Cannot resolve base type '{0}' of '{1}'.";
    pub const AMBIGUOUS_TYPE_REFERENCE: &str = "'{0}' is an ambiguous reference between {1}.";
    pub const CONFLICTING_PARTIAL_BASE_CLASSES: &str =
        "Partial declarations of '{0}' must not specify different base classes.";
    pub const CIRCULAR_BASE_TYPE: &str = "Circular base type dependency involving '{0}'.";

    pub const MEMBER_RESOLVED_AND_CACHED: &str =
        "Member '{0}' cannot be both resolved and cached.";
    pub const RESOLVED_PROPERTY_WITHOUT_SETTER: &str =
        "Resolved property '{0}' must declare a setter.";
    pub const RESOLVED_FIELD_READONLY: &str = "Resolved field '{0}' cannot be readonly.";
    pub const LOADER_MUST_RETURN_VOID: &str = "Dependency loader method '{0}' must return void.";
    pub const LOADER_CANNOT_BE_GENERIC: &str =
        "Dependency loader method '{0}' cannot declare type parameters.";
    pub const LOADER_PARAMETER_BY_REFERENCE: &str =
        "Parameter '{0}' of dependency loader method '{1}' cannot be passed by reference.";
    pub const CACHED_TYPE_NOT_IMPLEMENTED: &str =
        "'{0}' is not implemented by '{1}' and cannot be used as its cached type.";
    pub const ATTRIBUTE_INVALID_TARGET: &str = "Attribute '{0}' is not valid on {1} '{2}'.";
    pub const DUPLICATE_MEMBER: &str = "Member '{0}' is declared more than once in '{1}'.";
    pub const RESOLVED_MEMBER_OF_OWN_TYPE: &str =
        "Resolved member '{0}' has the type of its containing class and will not be injected.";
    pub const STATIC_MEMBER_NOT_ALLOWED: &str =
        "Static member '{0}' cannot take part in dependency injection.";

    pub const CANDIDATE_MUST_BE_PARTIAL: &str =
        "'{0}' is a dependency injection candidate and must be declared partial.";
    pub const CONTAINING_TYPE_MUST_BE_PARTIAL: &str =
        "'{0}' contains the dependency injection candidate '{1}' and must be declared partial.";

    pub const INTERNAL_EMIT_ERROR: &str = "Internal error while generating '{0}': {1}";
    pub const INTERNAL_ERROR: &str = "Internal error: {0}";
}

macro_rules! message {
    ($name:ident, $category:ident) => {
        DiagnosticMessage {
            code: diagnostic_codes::$name,
            category: DiagnosticCategory::$category,
            message: diagnostic_messages::$name,
        }
    };
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    message!(TOKEN_EXPECTED, Error),
    message!(UNEXPECTED_TOKEN, Error),
    message!(UNTERMINATED_STRING_LITERAL, Error),
    message!(UNTERMINATED_COMMENT, Error),
    message!(DECLARATION_NESTING_TOO_DEEP, Error),
    message!(CANNOT_RESOLVE_TYPE, Error),
    message!(CANNOT_RESOLVE_BASE_TYPE, Error),
    message!(AMBIGUOUS_TYPE_REFERENCE, Error),
    message!(CONFLICTING_PARTIAL_BASE_CLASSES, Error),
    message!(CIRCULAR_BASE_TYPE, Error),
    message!(MEMBER_RESOLVED_AND_CACHED, Error),
    message!(RESOLVED_PROPERTY_WITHOUT_SETTER, Error),
    message!(RESOLVED_FIELD_READONLY, Error),
    message!(LOADER_MUST_RETURN_VOID, Error),
    message!(LOADER_CANNOT_BE_GENERIC, Error),
    message!(LOADER_PARAMETER_BY_REFERENCE, Error),
    message!(CACHED_TYPE_NOT_IMPLEMENTED, Error),
    message!(ATTRIBUTE_INVALID_TARGET, Error),
    message!(DUPLICATE_MEMBER, Error),
    message!(RESOLVED_MEMBER_OF_OWN_TYPE, Warning),
    message!(STATIC_MEMBER_NOT_ALLOWED, Error),
    message!(CANDIDATE_MUST_BE_PARTIAL, Warning),
    message!(CONTAINING_TYPE_MUST_BE_PARTIAL, Warning),
    message!(INTERNAL_EMIT_ERROR, Error),
];
