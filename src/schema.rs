use crate::ast::{Entity, Value};
use crate::entities::ObjectReference;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Every concrete entity shape the grammar compiler knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Vector,
    Vector2D,
    Vector4,
    Rotator,
    SimpleSerializationVector,
    SimpleSerializationVector2D,
    SimpleSerializationRotator,
    LinearColor,
    KeyBinding,
    FunctionReference,
    VariableReference,
    MacroGraphReference,
    PinType,
    TerminalType,
    Pin,
    UnknownKeys,
    Object,
}

impl EntityKind {
    pub const ALL: [EntityKind; 17] = [
        EntityKind::Vector,
        EntityKind::Vector2D,
        EntityKind::Vector4,
        EntityKind::Rotator,
        EntityKind::SimpleSerializationVector,
        EntityKind::SimpleSerializationVector2D,
        EntityKind::SimpleSerializationRotator,
        EntityKind::LinearColor,
        EntityKind::KeyBinding,
        EntityKind::FunctionReference,
        EntityKind::VariableReference,
        EntityKind::MacroGraphReference,
        EntityKind::PinType,
        EntityKind::TerminalType,
        EntityKind::Pin,
        EntityKind::UnknownKeys,
        EntityKind::Object,
    ];

    pub fn name(self) -> &'static str {
        schema_of(self).name
    }
}

/// Registry key: a primitive, a leaf format or an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Null,
    Boolean,
    Integer,
    Integer64,
    Real,
    Byte,
    String,
    Symbol,
    Guid,
    ObjectReference,
    LocalizedText,
    FormatText,
    InvariantText,
    PinReference,
    /// A parenthesized list of unknown values.
    Array,
    /// The fallback alternation used for undeclared attributes.
    Unknown,
    /// A whole `Begin Object ... End Object` block.
    Object,
    Entity(EntityKind),
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Entity(kind) => f.write_str(kind.name()),
            other => write!(f, "{:?}", other),
        }
    }
}

/// The declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrType {
    Of(TypeTag),
    Array(&'static AttrType),
    /// Alternatives tried in order; the first structural match wins.
    Union(&'static [AttrType]),
}

impl AttrType {
    pub const fn entity(kind: EntityKind) -> Self {
        AttrType::Of(TypeTag::Entity(kind))
    }

    pub fn describe(&self) -> String {
        match self {
            AttrType::Of(tag) => tag.to_string(),
            AttrType::Array(item) => format!("array of {}", item.describe()),
            AttrType::Union(alternatives) => alternatives
                .iter()
                .map(AttrType::describe)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    /// No default: a missing attribute stays absent.
    Undefined,
    Null,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(&'static str),
    EmptyArray,
    NoneReference,
    Entity(EntityKind),
}

impl DefaultValue {
    pub fn to_value(&self) -> Option<Value> {
        Some(match self {
            DefaultValue::Undefined => return None,
            DefaultValue::Null => Value::Null,
            DefaultValue::Boolean(b) => Value::Boolean(*b),
            DefaultValue::Integer(i) => Value::Integer(*i),
            DefaultValue::Real(r) => Value::real(*r),
            DefaultValue::String(s) => Value::String((*s).to_string()),
            DefaultValue::EmptyArray => Value::Array(Vec::new()),
            DefaultValue::NoneReference => Value::ObjectReference(ObjectReference::none()),
            DefaultValue::Entity(kind) => Value::entity(Entity::with_defaults(*kind)),
        })
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (DefaultValue::NoneReference, Value::ObjectReference(reference)) => {
                reference.is_none()
            }
            _ => self.to_value().is_some_and(|default| default == *value),
        }
    }
}

/// Descriptor of one serializable field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttrType,
    pub default: DefaultValue,
    pub nullable: bool,
    pub inlined: bool,
    pub serialized: bool,
    pub suppress_default: bool,
    pub required: bool,
}

impl Attribute {
    pub const fn new(name: &'static str, ty: AttrType) -> Self {
        Self {
            name,
            ty,
            default: DefaultValue::Undefined,
            nullable: false,
            inlined: false,
            serialized: false,
            suppress_default: true,
            required: false,
        }
    }

    pub const fn default(mut self, default: DefaultValue) -> Self {
        self.default = default;
        self
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn inlined(mut self) -> Self {
        self.inlined = true;
        self
    }

    pub const fn serialized(mut self) -> Self {
        self.serialized = true;
        self
    }

    pub const fn show_default(mut self) -> Self {
        self.suppress_default = false;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Inlined entity attributes flatten into `Name.Child` keys.
    pub fn inlined_kind(&self) -> Option<EntityKind> {
        match self.ty {
            AttrType::Of(TypeTag::Entity(kind)) if self.inlined => Some(kind),
            _ => None,
        }
    }

    /// Inlined arrays flatten into `Name(index)` keys.
    pub fn inlined_item(&self) -> Option<&'static AttrType> {
        match self.ty {
            AttrType::Array(item) if self.inlined => Some(item),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeys {
    Reject,
    Accept,
}

impl UnknownKeys {
    pub fn allows(self, count: usize) -> bool {
        match self {
            UnknownKeys::Reject => count == 0,
            UnknownKeys::Accept => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookbehind {
    None,
    /// A fixed keyword in front of the parenthesis, e.g. `Pin (`.
    Keyword(&'static str),
    /// Any symbol, kept on the entity.
    Any,
}

/// The immutable attribute table of an entity kind.
#[derive(Debug)]
pub struct Schema {
    pub kind: EntityKind,
    pub name: &'static str,
    pub lookbehind: Lookbehind,
    pub attributes: &'static [Attribute],
    pub unknown_keys: UnknownKeys,
    pub trailing_comma: bool,
}

/// Where a parsed key lands in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'k> {
    Declared(usize),
    Inlined { index: usize, rest: &'k str },
    Indexed { index: usize, item: usize },
    Unknown,
}

/// The grammar that parses the value of one key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueGrammar {
    pub ty: &'static AttrType,
    pub nullable: bool,
    pub serialized: bool,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&'static Attribute> {
        let attributes: &'static [Attribute] = self.attributes;
        attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|attribute| attribute.name == name)
    }

    pub fn route<'k>(&self, key: &'k str) -> Route<'k> {
        if let Some(index) = self.attribute_index(key) {
            return Route::Declared(index);
        }
        if let Some((head, rest)) = key.split_once('.') {
            if let Some(index) = self.attribute_index(head) {
                if self.attributes[index].inlined_kind().is_some() {
                    return Route::Inlined { index, rest };
                }
            }
        }
        if let Some((head, item)) = split_indexed_key(key) {
            if let Some(index) = self.attribute_index(head) {
                if self.attributes[index].inlined_item().is_some() {
                    return Route::Indexed { index, item };
                }
            }
        }
        Route::Unknown
    }

    /// Resolves the value grammar for a key, descending into inlined attributes.
    /// `None` means the key is undeclared and takes the unknown-value grammar.
    pub fn value_grammar(&self, key: &str) -> Option<ValueGrammar> {
        let attributes: &'static [Attribute] = self.attributes;
        match self.route(key) {
            Route::Declared(index) => {
                let attribute = &attributes[index];
                Some(ValueGrammar {
                    ty: &attribute.ty,
                    nullable: attribute.nullable,
                    serialized: attribute.serialized,
                })
            }
            Route::Inlined { index, rest } => {
                let kind = attributes[index].inlined_kind()?;
                schema_of(kind).value_grammar(rest)
            }
            Route::Indexed { index, .. } => {
                let attribute = &attributes[index];
                Some(ValueGrammar {
                    ty: attribute.inlined_item()?,
                    nullable: attribute.nullable,
                    serialized: attribute.serialized,
                })
            }
            Route::Unknown => None,
        }
    }
}

/// Splits `Name(3)` into `("Name", 3)`.
pub fn split_indexed_key(key: &str) -> Option<(&str, usize)> {
    let open = key.find('(')?;
    let inner = key[open + 1..].strip_suffix(')')?;
    let index = inner.parse().ok()?;
    Some((&key[..open], index))
}

pub fn schema_of(kind: EntityKind) -> &'static Schema {
    match kind {
        EntityKind::Vector => &VECTOR,
        EntityKind::Vector2D => &VECTOR_2D,
        EntityKind::Vector4 => &VECTOR_4,
        EntityKind::Rotator => &ROTATOR,
        EntityKind::SimpleSerializationVector => &SIMPLE_VECTOR,
        EntityKind::SimpleSerializationVector2D => &SIMPLE_VECTOR_2D,
        EntityKind::SimpleSerializationRotator => &SIMPLE_ROTATOR,
        EntityKind::LinearColor => &LINEAR_COLOR,
        EntityKind::KeyBinding => &KEY_BINDING,
        EntityKind::FunctionReference => &FUNCTION_REFERENCE,
        EntityKind::VariableReference => &VARIABLE_REFERENCE,
        EntityKind::MacroGraphReference => &MACRO_GRAPH_REFERENCE,
        EntityKind::PinType => &PIN_TYPE,
        EntityKind::TerminalType => &TERMINAL_TYPE,
        EntityKind::Pin => &PIN,
        EntityKind::UnknownKeys => &UNKNOWN_KEYS,
        EntityKind::Object => &OBJECT,
    }
}

const BOOLEAN: AttrType = AttrType::Of(TypeTag::Boolean);
const INTEGER: AttrType = AttrType::Of(TypeTag::Integer);
const REAL: AttrType = AttrType::Of(TypeTag::Real);
const STRING: AttrType = AttrType::Of(TypeTag::String);
const SYMBOL: AttrType = AttrType::Of(TypeTag::Symbol);
const GUID: AttrType = AttrType::Of(TypeTag::Guid);
const REFERENCE: AttrType = AttrType::Of(TypeTag::ObjectReference);

/// Display text in any of its spellings.
const TEXT: AttrType = AttrType::Union(&[
    AttrType::Of(TypeTag::LocalizedText),
    AttrType::Of(TypeTag::FormatText),
    AttrType::Of(TypeTag::InvariantText),
    STRING,
]);

const fn flag(name: &'static str) -> Attribute {
    Attribute::new(name, BOOLEAN)
        .default(DefaultValue::Boolean(false))
        .show_default()
}

const fn component(name: &'static str) -> Attribute {
    Attribute::new(name, REAL).required()
}

const ENTITY: Schema = Schema {
    kind: EntityKind::UnknownKeys,
    name: "",
    lookbehind: Lookbehind::None,
    attributes: &[],
    unknown_keys: UnknownKeys::Reject,
    trailing_comma: false,
};

pub static VECTOR: Schema = Schema {
    kind: EntityKind::Vector,
    name: "Vector",
    attributes: &[component("X"), component("Y"), component("Z")],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static VECTOR_2D: Schema = Schema {
    kind: EntityKind::Vector2D,
    name: "Vector2D",
    attributes: &[component("X"), component("Y")],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static VECTOR_4: Schema = Schema {
    kind: EntityKind::Vector4,
    name: "Vector4",
    attributes: &[
        component("X"),
        component("Y"),
        component("Z"),
        component("W"),
    ],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static ROTATOR: Schema = Schema {
    kind: EntityKind::Rotator,
    name: "Rotator",
    attributes: &[component("R"), component("P"), component("Y")],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static SIMPLE_VECTOR: Schema = Schema {
    kind: EntityKind::SimpleSerializationVector,
    name: "SimpleSerializationVector",
    attributes: &[component("X"), component("Y"), component("Z")],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static SIMPLE_VECTOR_2D: Schema = Schema {
    kind: EntityKind::SimpleSerializationVector2D,
    name: "SimpleSerializationVector2D",
    attributes: &[component("X"), component("Y")],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static SIMPLE_ROTATOR: Schema = Schema {
    kind: EntityKind::SimpleSerializationRotator,
    name: "SimpleSerializationRotator",
    attributes: &[component("R"), component("P"), component("Y")],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static LINEAR_COLOR: Schema = Schema {
    kind: EntityKind::LinearColor,
    name: "LinearColor",
    attributes: &[
        Attribute::new("R", REAL).required().show_default(),
        Attribute::new("G", REAL).required().show_default(),
        Attribute::new("B", REAL).required().show_default(),
        Attribute::new("A", REAL)
            .default(DefaultValue::Real(1.0))
            .show_default(),
    ],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static KEY_BINDING: Schema = Schema {
    kind: EntityKind::KeyBinding,
    name: "KeyBinding",
    attributes: &[
        Attribute::new("ActionName", STRING).default(DefaultValue::String("")),
        Attribute::new("bShift", BOOLEAN).default(DefaultValue::Boolean(false)),
        Attribute::new("bCtrl", BOOLEAN).default(DefaultValue::Boolean(false)),
        Attribute::new("bAlt", BOOLEAN).default(DefaultValue::Boolean(false)),
        Attribute::new("bCmd", BOOLEAN).default(DefaultValue::Boolean(false)),
        Attribute::new("Key", SYMBOL).required(),
    ],
    unknown_keys: UnknownKeys::Reject,
    ..ENTITY
};

pub static FUNCTION_REFERENCE: Schema = Schema {
    kind: EntityKind::FunctionReference,
    name: "FunctionReference",
    attributes: &[
        Attribute::new("MemberParent", REFERENCE),
        Attribute::new("MemberName", STRING),
        Attribute::new("MemberGuid", GUID),
        Attribute::new("bSelfContext", BOOLEAN),
    ],
    unknown_keys: UnknownKeys::Accept,
    ..ENTITY
};

pub static VARIABLE_REFERENCE: Schema = Schema {
    kind: EntityKind::VariableReference,
    name: "VariableReference",
    attributes: &[
        Attribute::new("MemberScope", STRING),
        Attribute::new("MemberParent", REFERENCE),
        Attribute::new("MemberName", STRING),
        Attribute::new("MemberGuid", GUID),
        Attribute::new("bSelfContext", BOOLEAN),
    ],
    unknown_keys: UnknownKeys::Accept,
    ..ENTITY
};

pub static MACRO_GRAPH_REFERENCE: Schema = Schema {
    kind: EntityKind::MacroGraphReference,
    name: "MacroGraphReference",
    attributes: &[
        Attribute::new("MacroGraph", REFERENCE),
        Attribute::new("GraphBlueprint", REFERENCE),
        Attribute::new("GraphGuid", GUID),
    ],
    unknown_keys: UnknownKeys::Accept,
    ..ENTITY
};

pub static TERMINAL_TYPE: Schema = Schema {
    kind: EntityKind::TerminalType,
    name: "TerminalType",
    attributes: &[
        Attribute::new("TerminalCategory", STRING)
            .default(DefaultValue::String(""))
            .show_default(),
        Attribute::new("TerminalSubCategory", STRING)
            .default(DefaultValue::String(""))
            .show_default(),
        Attribute::new("TerminalSubCategoryObject", REFERENCE)
            .default(DefaultValue::NoneReference)
            .show_default(),
        flag("bTerminalIsConst"),
        flag("bTerminalIsWeakPointer"),
        flag("bTerminalIsUObjectWrapper"),
    ],
    unknown_keys: UnknownKeys::Accept,
    ..ENTITY
};

pub static PIN_TYPE: Schema = Schema {
    kind: EntityKind::PinType,
    name: "PinType",
    attributes: &[
        Attribute::new("PinCategory", STRING)
            .default(DefaultValue::String(""))
            .show_default(),
        Attribute::new("PinSubCategory", STRING)
            .default(DefaultValue::String(""))
            .show_default(),
        Attribute::new("PinSubCategoryObject", REFERENCE)
            .default(DefaultValue::NoneReference)
            .show_default(),
        Attribute::new(
            "PinSubCategoryMemberReference",
            AttrType::entity(EntityKind::FunctionReference),
        )
        .nullable()
        .default(DefaultValue::Null)
        .show_default(),
        Attribute::new("PinValueType", AttrType::entity(EntityKind::TerminalType))
            .nullable()
            .default(DefaultValue::Null)
            .show_default(),
        Attribute::new("ContainerType", REFERENCE)
            .default(DefaultValue::NoneReference)
            .show_default(),
        flag("bIsReference"),
        flag("bIsConst"),
        flag("bIsWeakPointer"),
        flag("bIsUObjectWrapper"),
        flag("bSerializeAsSinglePrecisionFloat"),
    ],
    unknown_keys: UnknownKeys::Accept,
    ..ENTITY
};

pub static PIN: Schema = Schema {
    kind: EntityKind::Pin,
    name: "Pin",
    lookbehind: Lookbehind::Keyword("Pin"),
    attributes: &[
        Attribute::new("PinId", GUID),
        Attribute::new("PinName", STRING).default(DefaultValue::String("")),
        Attribute::new("PinFriendlyName", TEXT)
            .nullable()
            .default(DefaultValue::Null),
        Attribute::new("PinToolTip", STRING).default(DefaultValue::String("")),
        Attribute::new("Direction", STRING).default(DefaultValue::String("")),
        Attribute::new("PinType", AttrType::entity(EntityKind::PinType))
            .inlined()
            .default(DefaultValue::Entity(EntityKind::PinType))
            .show_default(),
        Attribute::new(
            "LinkedTo",
            AttrType::Array(&AttrType::Of(TypeTag::PinReference)),
        ),
        Attribute::new("SubPins", AttrType::Array(&REFERENCE)),
        Attribute::new("ParentPin", REFERENCE),
        Attribute::new(
            "DefaultValue",
            AttrType::Union(&[AttrType::entity(EntityKind::LinearColor), STRING]),
        )
        .serialized(),
        Attribute::new("AutogeneratedDefaultValue", STRING),
        Attribute::new("DefaultObject", REFERENCE),
        Attribute::new("DefaultTextValue", TEXT),
        Attribute::new("PersistentGuid", GUID),
        flag("bHidden"),
        flag("bNotConnectable"),
        flag("bDefaultValueIsReadOnly"),
        flag("bDefaultValueIsIgnored"),
        flag("bAdvancedView"),
        flag("bOrphanedPin"),
    ],
    unknown_keys: UnknownKeys::Accept,
    trailing_comma: true,
};

pub static UNKNOWN_KEYS: Schema = Schema {
    kind: EntityKind::UnknownKeys,
    name: "UnknownKeys",
    lookbehind: Lookbehind::Any,
    attributes: &[],
    unknown_keys: UnknownKeys::Accept,
    trailing_comma: false,
};

/// Body attributes of a `Begin Object` block. None of them carry defaults so that a block is
/// written back with exactly the attributes it was read with.
pub static OBJECT: Schema = Schema {
    kind: EntityKind::Object,
    name: "Object",
    attributes: &[
        Attribute::new("bIsPureFunc", BOOLEAN),
        Attribute::new("bIsConstFunc", BOOLEAN),
        Attribute::new("VariableReference", AttrType::entity(EntityKind::VariableReference)),
        Attribute::new("SelfContextInfo", SYMBOL),
        Attribute::new("DelegatePropertyName", STRING),
        Attribute::new("DelegateOwnerClass", REFERENCE),
        Attribute::new("ComponentPropertyName", STRING),
        Attribute::new("EventReference", AttrType::entity(EntityKind::FunctionReference)),
        Attribute::new("FunctionReference", AttrType::entity(EntityKind::FunctionReference)),
        Attribute::new("CustomFunctionName", STRING),
        Attribute::new("TargetType", REFERENCE),
        Attribute::new("MacroGraphReference", AttrType::entity(EntityKind::MacroGraphReference)),
        Attribute::new("Enum", REFERENCE),
        Attribute::new("EnumEntries", AttrType::Array(&STRING)).inlined(),
        Attribute::new("PinNames", AttrType::Array(&STRING)).inlined(),
        Attribute::new("InputKey", AttrType::entity(EntityKind::KeyBinding)),
        Attribute::new("NumAdditionalInputs", INTEGER),
        Attribute::new("bOverrideFunction", BOOLEAN),
        Attribute::new("bInternalEvent", BOOLEAN),
        Attribute::new("bConsumeInput", BOOLEAN),
        Attribute::new("bExecuteWhenPaused", BOOLEAN),
        Attribute::new("bOverrideParentBinding", BOOLEAN),
        Attribute::new("bControl", BOOLEAN),
        Attribute::new("bAlt", BOOLEAN),
        Attribute::new("bShift", BOOLEAN),
        Attribute::new("bCommand", BOOLEAN),
        Attribute::new("CommentColor", AttrType::entity(EntityKind::LinearColor)),
        Attribute::new("bCommentBubbleVisible_InDetailsPanel", BOOLEAN),
        Attribute::new("bColorCommentBubble", BOOLEAN),
        Attribute::new("MoveMode", SYMBOL),
        Attribute::new("NodePosX", INTEGER),
        Attribute::new("NodePosY", INTEGER),
        Attribute::new("NodeWidth", INTEGER),
        Attribute::new("NodeHeight", INTEGER),
        Attribute::new("bCanRenameNode", BOOLEAN),
        Attribute::new("bCommentBubblePinned", BOOLEAN),
        Attribute::new("bCommentBubbleVisible", BOOLEAN),
        Attribute::new("NodeComment", STRING),
        Attribute::new("AdvancedPinDisplay", SYMBOL),
        Attribute::new("EnabledState", SYMBOL),
        Attribute::new("NodeGuid", GUID),
        Attribute::new("ErrorType", INTEGER),
        Attribute::new("ErrorMsg", STRING),
        Attribute::new("MaterialExpression", REFERENCE),
        Attribute::new("MaterialExpressionEditorX", INTEGER),
        Attribute::new("MaterialExpressionEditorY", INTEGER),
        Attribute::new("MaterialExpressionGuid", GUID),
        Attribute::new("Material", REFERENCE),
        Attribute::new("Constant", AttrType::entity(EntityKind::LinearColor)),
        Attribute::new("R", REAL),
        Attribute::new("G", REAL),
        Attribute::new("B", REAL),
        Attribute::new("A", REAL),
        Attribute::new("ParameterName", STRING),
        Attribute::new("ExpressionGUID", GUID),
        Attribute::new("PinTags", AttrType::Array(&AttrType::Of(TypeTag::Unknown))),
    ],
    unknown_keys: UnknownKeys::Accept,
    ..ENTITY
};
