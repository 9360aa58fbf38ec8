use pretty_assertions::assert_eq;
use ueblueprint_core::{
    read, read_entity, read_value, write, Byte, Entity, EntityKind, FormatText, Guid, KeyBinding,
    LinearColor, Pin, Rotator, TypeTag, Value, Vector, Vector2D, write_value,
};

fn real(value: f64) -> Value {
    Value::real(value)
}

fn unknown(source: &str) -> Value {
    read_value(TypeTag::Unknown, source)
        .unwrap_or_else(|err| panic!("`{source}` failed: {:?}", miette::Report::from(err)))
}

fn unknown_keys(lookbehind: Option<&str>, pairs: Vec<(&str, Value)>) -> Value {
    let mut entity = match lookbehind {
        Some(lookbehind) => Entity::new(EntityKind::UnknownKeys).with_lookbehind(lookbehind),
        None => Entity::new(EntityKind::UnknownKeys),
    };
    for (key, value) in pairs {
        entity.set(key, value);
    }
    Value::entity(entity)
}

fn rounded(values: [f64; 4]) -> [f64; 4] {
    values.map(|value| (value * 1000.0).round() / 1000.0)
}

#[test]
fn test_byte() {
    assert_eq!(read::<Byte>("0").unwrap(), Byte::new(0));
    assert_eq!(read::<Byte>("+255").unwrap(), Byte::new(255));
    assert_eq!(write(&read::<Byte>("+7").unwrap(), false).unwrap(), "7");
    assert!(read::<Byte>("256").is_err());
    assert!(read::<Byte>("-1").is_err());
}

#[test]
fn test_array() {
    assert_eq!(read::<Vec<Value>>("()").unwrap(), vec![]);
    assert_eq!(read::<Vec<Value>>("( )").unwrap(), vec![]);
    assert_eq!(
        read::<Vec<Value>>("(1, 2, 3, 4, 5, 6)").unwrap(),
        (1..=6).map(|i| real(f64::from(i))).collect::<Vec<_>>()
    );
    assert_eq!(
        read::<Vec<Value>>(
            r#"(
        "alpha",
        "beta",
        123,
        3BEF2168446CAA32D5B54289FAB2F0BA,
        Some(a=1, b="2")
    )"#
        )
        .unwrap(),
        vec![
            Value::from("alpha"),
            Value::from("beta"),
            real(123.0),
            Value::Guid(Guid::new("3BEF2168446CAA32D5B54289FAB2F0BA").unwrap()),
            unknown_keys(Some("Some"), vec![("a", real(1.0)), ("b", Value::from("2"))]),
        ]
    );
    assert_eq!(
        read::<Vec<Value>>(
            r#"(
        A(first = (9,8,7,6,5), second = 00000000000000000000000000000000),
        B(key="hello"),
    )"#
        )
        .unwrap(),
        vec![
            unknown_keys(
                Some("A"),
                vec![
                    ("first", Value::Array([9.0, 8.0, 7.0, 6.0, 5.0].map(real).to_vec())),
                    ("second", Value::Guid(Guid::zero())),
                ]
            ),
            unknown_keys(Some("B"), vec![("key", Value::from("hello"))]),
        ]
    );
}

#[test]
fn test_nested_arrays() {
    let pair = |a: f64, b: f64| Value::Array(vec![real(a), real(b)]);
    assert_eq!(
        read::<Vec<Value>>("((1, 2), (3, 4))").unwrap(),
        vec![pair(1.0, 2.0), pair(3.0, 4.0)]
    );
    assert_eq!(
        read::<Vec<Value>>("(((1, 2), (3, 4)), 5)").unwrap(),
        vec![Value::Array(vec![pair(1.0, 2.0), pair(3.0, 4.0)]), real(5.0)]
    );
    let innermost = Value::Array(vec![real(3.0), Value::Array(vec![real(4.0)])]);
    let nested = Value::Array(vec![
        real(1.0),
        Value::Array(vec![real(2.0), innermost]),
    ]);
    assert_eq!(
        read::<Vec<Value>>("(\n    One(a = (1,(2,(3,(4)))), b = ()),\n)").unwrap(),
        vec![unknown_keys(Some("One"), vec![("a", nested), ("b", Value::Null)])]
    );
}

#[test]
fn test_boolean() {
    assert!(read::<bool>("true").unwrap());
    assert!(read::<bool>("True").unwrap());
    assert!(!read::<bool>("false").unwrap());
    assert!(!read::<bool>("False").unwrap());
}

#[test]
fn test_format_text() {
    let named = read::<FormatText>(
        r#"LOCGEN_FORMAT_NAMED(NSLOCTEXT("KismetSchema", "SplitPinFriendlyNameFormat", "{PinDisplayName} {ProtoPinDisplayName}"), "PinDisplayName", "Out Hit", "ProtoPinDisplayName", "Blocking Hit")"#,
    )
    .unwrap();
    assert_eq!(named.to_string(), "Out Hit Blocking Hit");

    let named = read::<FormatText>(
        r#"LOCGEN_FORMAT_NAMED(NSLOCTEXT("KismetSchema", "SplitPinFriendlyNameFormat", "{PinDisplayName} {ProtoPinDisplayName}"), "PinDisplayName", "Out Hit", "ProtoPinDisplayName", "Hit Bone Name")"#,
    )
    .unwrap();
    assert_eq!(named.to_string(), "Out Hit Hit Bone Name");

    let ordered = read::<FormatText>(
        r#"LOCGEN_FORMAT_ORDERED(
                NSLOCTEXT(
                    "PCGSettings",
                    "OverridableParamPinTooltip",
                    "{0}Attribute type is \"{1}\" and its exact name is \"{2}\""
                ),
                "If InRangeMin = InRangeMax, then that density value is mapped to the average of OutRangeMin and OutRangeMax\n",
                "float",
                "InRangeMin"
            )"#,
    )
    .unwrap();
    assert_eq!(
        ordered.to_string(),
        "If InRangeMin = InRangeMax, then that density value is mapped to the average of OutRangeMin and OutRangeMax\nAttribute type is \"float\" and its exact name is \"InRangeMin\""
    );
}

#[test]
fn test_guid() {
    for source in [
        "0556a3ecabf648d0a5c07b2478e9dd32",
        "64023BC344E0453DBB583FAC411489BC",
        "6edC4a425ca948da8bC78bA52DED6C6C",
    ] {
        assert_eq!(read::<Guid>(source).unwrap().as_str(), source);
    }
    assert!(read::<Guid>("172087193 9B04362973544B3564FDB2C").is_err());
    assert!(read::<Guid>("E25F14F8F3E9441AB07153E7DA2BA2B").is_err());
    assert!(read::<Guid>("A78988B0097E48418C8CB87EC5A67ABF7").is_err());
}

#[test]
fn test_integer() {
    for (source, expected) in [
        ("0", 0),
        ("+0", 0),
        ("-0", 0),
        ("99", 99),
        ("-8685", -8685),
        ("+555", 555),
        ("1000000000", 1_000_000_000),
    ] {
        assert_eq!(read::<i32>(source).unwrap(), expected, "reading `{source}`");
    }
    assert!(read::<i32>("1.2").is_err());
}

#[test]
fn test_key_binding() {
    let binding = read::<KeyBinding>("A").unwrap();
    assert_eq!(binding.key, "A");
    assert!(!binding.ctrl);

    let binding = read::<KeyBinding>("(bCtrl=True,Key=A)").unwrap();
    assert_eq!(binding.key, "A");
    assert!(binding.ctrl);

    let binding = read::<KeyBinding>("(bCtrl=false,bShift=false,bCmd=true,bAlt=false,Key=X)").unwrap();
    assert_eq!((binding.key.as_str(), binding.alt, binding.ctrl, binding.cmd), ("X", false, false, true));

    let binding =
        read::<KeyBinding>("(       bCtrl=  false  \n,       Key \n\n\n  =Y ,bAlt=true     )").unwrap();
    assert_eq!((binding.key.as_str(), binding.alt, binding.ctrl), ("Y", true, false));
}

#[test]
fn test_bare_key_binding_is_written_bare() {
    let entity = read_entity(EntityKind::KeyBinding, "Enter").unwrap();
    assert_eq!(KeyBinding::from_entity(&entity).unwrap().key, "Enter");
    assert_eq!(write_value(&Value::entity(entity), false).unwrap(), "Enter");
}

#[test]
fn test_linear_color() {
    let color = read::<LinearColor>("(R=1,G=0,B=0)").unwrap();
    assert_eq!(color.to_rgba(), [255, 0, 0, 255]);
    assert_eq!(color.to_rgba_string(), "FF0000FF");
    assert_eq!(color.to_number(), -16776961);
    assert_eq!(rounded(color.to_hsva()), [0.0, 1.0, 1.0, 1.0]);

    let color = read::<LinearColor>("(R=0.000000,G=0.660000,B=1.000000,A=1.000000)").unwrap();
    assert_eq!(color.to_rgba(), [0, 168, 255, 255]);
    assert_eq!(color.to_rgba_string(), "00A8FFFF");
    assert_eq!(color.to_number(), 11075583);
    assert_eq!(rounded(color.to_hsva()), [0.557, 1.0, 1.0, 1.0]);

    let color = read::<LinearColor>(
        "(B=0.04394509003266556,G=0.026789300067696642,A=0.83663232408635,R=0.6884158028074934,)",
    )
    .unwrap();
    assert_eq!(color.to_rgba(), [176, 7, 11, 213]);
    assert_eq!(color.to_rgba_string(), "B0070BD5");
    assert_eq!(color.to_number(), -1341715499);
    assert_eq!(rounded(color.to_hsva()), [0.996, 0.961, 0.688, 0.837]);

    let color = read::<LinearColor>(
        "(
                    A     = 0.327     ,
              R=0.530   ,             G  =      0.685
                ,B
                       =       0.9    ,)",
    )
    .unwrap();
    assert_eq!(color.to_rgba(), [135, 175, 230, 83]);
    assert_eq!(color.to_rgba_string(), "87AFE653");
    assert_eq!(color.to_number(), -2018515373);
    assert_eq!(rounded(color.to_hsva()), [0.597, 0.411, 0.9, 0.327]);

    assert!(read::<LinearColor>("(R=0.000000,G=0.660000,A=1.000000)").is_err());
    assert!(read::<LinearColor>("(R=0.000000,G=\"hello\",A=1.000000)").is_err());
}

#[test]
fn test_null() {
    assert_eq!(read::<()>("()").unwrap(), ());
    assert!(read::<()>("123").is_err());
    assert!(read::<()>("(a)").is_err());
    assert!(read::<()>("(").is_err());
}

#[test]
fn test_number() {
    for (source, expected) in [
        ("0", 0.0),
        ("+0", 0.0),
        ("-0", 0.0),
        ("5", 5.0),
        ("0.05", 0.05),
        ("-999.666", -999.666),
        ("+45.4545", 45.4545),
        ("+1000000000", 1e9),
    ] {
        let value = read::<f64>(source).unwrap();
        assert!((value - expected).abs() < 1e-5, "`{source}` read as {value}");
    }
    assert_eq!(read::<f64>("inf").unwrap(), f64::INFINITY);
    assert_eq!(read::<f64>("+inf").unwrap(), f64::INFINITY);
    assert_eq!(read::<f64>("-inf").unwrap(), f64::NEG_INFINITY);
    assert!(read::<f64>("alpha").is_err());
}

#[test]
fn test_pin() {
    let pin = read::<Pin>("Pin (PinType.PinSubCategoryMemberReference=())").unwrap();
    let pin_type = pin.pin_type().expect("pin type is always present");
    assert_eq!(pin_type.get("PinSubCategoryMemberReference"), Some(&Value::Null));
    assert_eq!(pin.category(), "");
    assert!(pin.is_input());
}

#[test]
fn test_simple_serialization_rotator() {
    let read_rotator = |source: &str| {
        let entity = read_entity(EntityKind::SimpleSerializationRotator, source).unwrap();
        Rotator::from_entity(&entity).unwrap()
    };
    assert_eq!(read_rotator("0, 0, 0"), Rotator::new(0.0, 0.0, 0.0));
    assert_eq!(read_rotator("0.65, 1.0, 0.99"), Rotator::new(0.99, 0.65, 1.0));
    assert_eq!(read_rotator("7,6,5"), Rotator::new(5.0, 7.0, 6.0));
}

#[test]
fn test_simple_serialization_vectors() {
    let read_vector_2d = |source: &str| {
        let entity = read_entity(EntityKind::SimpleSerializationVector2D, source).unwrap();
        Vector2D::from_entity(&entity).unwrap()
    };
    assert_eq!(read_vector_2d("0, 0"), Vector2D::new(0.0, 0.0));
    assert_eq!(read_vector_2d("127.8, 13.3"), Vector2D::new(127.8, 13.3));
    assert_eq!(read_vector_2d("5,0"), Vector2D::new(5.0, 0.0));

    let read_vector = |source: &str| {
        let entity = read_entity(EntityKind::SimpleSerializationVector, source).unwrap();
        Vector::from_entity(&entity).unwrap()
    };
    assert_eq!(read_vector("0, 0, 0"), Vector::new(0.0, 0.0, 0.0));
    assert_eq!(read_vector("1001, 56.4, 0.5"), Vector::new(1001.0, 56.4, 0.5));
    assert_eq!(read_vector("-1,-2,-3"), Vector::new(-1.0, -2.0, -3.0));
}

#[test]
fn test_string() {
    assert_eq!(read::<String>(r#""""#).unwrap(), "");
    assert_eq!(read::<String>(r#""hello""#).unwrap(), "hello");
    assert_eq!(
        read::<String>(r#""hello world 123 - éèàò@ç ^ ^^^""#).unwrap(),
        "hello world 123 - éèàò@ç ^ ^^^"
    );
    assert_eq!(read::<String>(r#""\"""#).unwrap(), "\"");
    assert!(read::<String>("Hello").is_err());

    let text = "\"/Script/CoreUObject.Class'/Script/Interhaptics.HapticSource'\"".to_string();
    assert_eq!(
        write(&text, false).unwrap(),
        r#""\"/Script/CoreUObject.Class'/Script/Interhaptics.HapticSource'\"""#
    );
}

#[test]
fn test_unknown_value_alternation() {
    let tag = |source: &str| unknown(source).type_tag();
    assert_eq!(tag("\"Hello\""), TypeTag::String);
    assert_eq!(unknown("()"), Value::Null);
    assert_eq!(tag("8345"), TypeTag::Real);
    assert_eq!(tag("True"), TypeTag::Boolean);
    assert_eq!(tag("False"), TypeTag::Boolean);
    assert_eq!(tag("F0223D3742E67C0D9FEFB2A64946B7F0"), TypeTag::Guid);
    assert_eq!(tag("SYMBOL1"), TypeTag::Symbol);
    assert_eq!(tag("Symbol_2_3_4"), TypeTag::Symbol);
    assert_eq!(tag("(X=-0.495,  Y=0, )"), TypeTag::Entity(EntityKind::Vector2D));
    assert_eq!(tag("(X=-0.495,Y=+765.0,Z=7)"), TypeTag::Entity(EntityKind::Vector));
    assert_eq!(tag("(R=1.000000,P=7.6,Y=+88.99)"), TypeTag::Entity(EntityKind::Rotator));
    assert_eq!(
        tag("(R=0.000000,G=0.660000,B=1.000000,A=1.000000)"),
        TypeTag::Entity(EntityKind::LinearColor)
    );
    assert_eq!(
        tag(r#"Class'"/Script/Engine.KismetSystemLibrary"'"#),
        TypeTag::ObjectReference
    );
    assert_eq!(
        unknown("(1,2,3,4,5,6,7,8,9)"),
        Value::Array((1..=9).map(|i| real(f64::from(i))).collect())
    );
    assert_eq!(
        unknown(r#"( "Hello",  "World",  )"#),
        Value::Array(vec![Value::from("Hello"), Value::from("World")])
    );
    assert_eq!(
        unknown(r#"( "Alpha", 123, Beta, "Gamma", "Delta", 99  )"#),
        Value::Array(vec![
            Value::from("Alpha"),
            real(123.0),
            Value::Symbol("Beta".to_string()),
            Value::from("Gamma"),
            Value::from("Delta"),
            real(99.0),
        ])
    );
}

#[test]
fn test_unknown_keys() {
    let value = read_value(
        TypeTag::Entity(EntityKind::UnknownKeys),
        r#"LookbehindValue(FirstKey=1,SecondKey=SOME_SYMBOL2,ThirdKey="Hello")"#,
    )
    .unwrap();
    assert_eq!(
        value,
        unknown_keys(
            Some("LookbehindValue"),
            vec![
                ("FirstKey", real(1.0)),
                ("SecondKey", Value::Symbol("SOME_SYMBOL2".to_string())),
                ("ThirdKey", Value::from("Hello")),
            ]
        )
    );

    let value = read_value(
        TypeTag::Entity(EntityKind::UnknownKeys),
        r#"(A = (-1,-2,-3),  B = SomeFunction(B1 = "b1", B2 = (X=101,Y=102,Z=103)))"#,
    )
    .unwrap();
    assert_eq!(
        value,
        unknown_keys(
            None,
            vec![
                ("A", Value::Array(vec![real(-1.0), real(-2.0), real(-3.0)])),
                (
                    "B",
                    unknown_keys(
                        Some("SomeFunction"),
                        vec![
                            ("B1", Value::from("b1")),
                            ("B2", Value::entity(Vector::new(101.0, 102.0, 103.0).to_entity())),
                        ]
                    )
                ),
            ]
        )
    );
}

#[test]
fn test_vector() {
    assert_eq!(read::<Vector>("(X=1,Y=2,Z=3.5)").unwrap(), Vector::new(1.0, 2.0, 3.5));
    assert_eq!(
        read::<Vector>("(X=10,Y=+20.88,Z=-30.54,)").unwrap(),
        Vector::new(10.0, 20.88, -30.54)
    );
    assert_eq!(
        read::<Vector>(
            "(
            Z  =   -3.66    ,

                        X
                            =        -1 ,     Y       =


                    -2
  ,
        )"
        )
        .unwrap(),
        Vector::new(-1.0, -2.0, -3.66)
    );
    assert!(read::<Vector>("(X=1,Y=\"2\",Z=3)").is_err());
    assert!(read::<Vector>("(X=1,Z=3)").is_err());
    assert!(read::<Vector>("(X=1,Y=2,Unexpected=6,Z=3.5)").is_err());
}

#[test]
fn test_vector_2d() {
    assert_eq!(read::<Vector2D>("(X=78,Y=56.3)").unwrap(), Vector2D::new(78.0, 56.3));
    assert_eq!(read::<Vector2D>("(X=+4.5,Y=-8.88,)").unwrap(), Vector2D::new(4.5, -8.88));
    assert_eq!(
        read::<Vector2D>(
            "(
            Y  =   +93.004    ,

                        X
                            =        0 ,
        )"
        )
        .unwrap(),
        Vector2D::new(0.0, 93.004)
    );
    assert!(read::<Vector2D>("(X=1,Y=\"2\")").is_err());
    assert!(read::<Vector2D>("(X=1)").is_err());
    assert!(read::<Vector2D>("(X=777, Y=555, Unexpected=6, HH=2)").is_err());
}
