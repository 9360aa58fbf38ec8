use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use ueblueprint_core::{
    read_document, read_multiple, read_multiple_with, write_multiple, Guid, Options, PinDirection,
    Value,
};

fn get_test_file_path(file_name: &str) -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "tests", "ok", file_name]
        .iter()
        .collect()
}

fn read_test_file(file_name: &str) -> String {
    let path = get_test_file_path(file_name);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture {}", path.display()))
}

fn guid(text: &str) -> Guid {
    Guid::new(text).unwrap()
}

#[test]
fn test_print_speed_objects() {
    let objects = read_multiple(&read_test_file("print_speed.t3d")).unwrap();
    assert_eq!(objects.len(), 2);

    let getter = &objects[0];
    assert_eq!(getter.name(), Some("K2Node_VariableGet_0"));
    assert_eq!(
        getter.class.as_ref().map(|class| class.type_name()),
        Some("/Script/BlueprintGraph.K2Node_VariableGet")
    );
    let export_path = getter.export_path.as_ref().unwrap();
    assert_eq!(export_path.type_name(), "/Script/BlueprintGraph.K2Node_VariableGet");
    assert_eq!(
        export_path.path(),
        "/Game/Blueprints/BP_Player.BP_Player:EventGraph.K2Node_VariableGet_0"
    );
    assert_eq!(getter.node_position(), Some((-320, 96)));
    assert_eq!(getter.pins().len(), 2);

    let variable = getter.get("VariableReference").and_then(Value::as_entity).unwrap();
    assert_eq!(variable.str("MemberName"), Some("Speed"));
    assert_eq!(variable.bool("bSelfContext"), Some(true));

    let call = &objects[1];
    assert_eq!(call.name(), Some("K2Node_CallFunction_3"));
    assert_eq!(call.node_position(), Some((64, 96)));
    assert_eq!(call.get("AdvancedPinDisplay"), Some(&Value::Symbol("Hidden".to_string())));
    let function = call.get("FunctionReference").and_then(Value::as_entity).unwrap();
    assert_eq!(function.str("MemberName"), Some("PrintString"));
    assert_eq!(
        function
            .get("MemberParent")
            .and_then(Value::as_object_reference)
            .map(|reference| reference.path()),
        Some("/Script/Engine.KismetSystemLibrary")
    );
}

#[test]
fn test_print_speed_pins() {
    let objects = read_multiple(&read_test_file("print_speed.t3d")).unwrap();
    let getter = &objects[0];
    let call = &objects[1];

    let speed = getter.find_pin_by_name("Speed").unwrap();
    assert_eq!(speed.direction(), PinDirection::Output);
    assert_eq!(speed.category(), "real");
    assert!(speed.is_linked());

    let own_self = getter.find_pin(&guid("3E5C7A98B6D4F3101E3C5A7896B4D2F0")).unwrap();
    assert!(own_self.is_hidden());
    assert_eq!(own_self.display_name(), "Target");
    assert_eq!(
        own_self.sub_category_object().map(|reference| reference.name()),
        Some("BP_Player")
    );

    let target = call.find_pin(&guid("F971EA62DB53CC4078F169E25AD34BC0")).unwrap();
    assert_eq!(target.direction(), PinDirection::Hidden);
    assert!(target.get("DefaultObject").is_some());

    let color = call.find_pin_by_name("TextColor").unwrap();
    let default_color = color.default_color().unwrap();
    assert_eq!(default_color.to_rgba(), [0, 168, 255, 255]);

    let duration = call.find_pin_by_name("Duration").unwrap();
    assert_eq!(duration.default_value(), Some(&Value::from("2.000000")));
    assert_eq!(duration.default_color(), None);

    let in_string = call.find_pin_by_name("InString").unwrap();
    assert_eq!(in_string.default_value(), Some(&Value::from("Hello")));
    assert!(in_string.is_input());
}

#[test]
fn test_print_speed_links_resolve() {
    let document = read_document(&read_test_file("print_speed.t3d")).unwrap();
    let speed = document
        .find_pin("K2Node_VariableGet_0", &guid("1F2E3D4C5B6A79880F1E2D3C4B5A6978"))
        .unwrap();
    let linked: Vec<_> = document.linked_pins(speed).collect();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].pin_name(), "InString");

    let back: Vec<_> = document.linked_pins(linked[0]).collect();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].pin_name(), "Speed");
}

#[test]
fn test_connect_new_link() {
    let mut document = read_document(&read_test_file("print_speed.t3d")).unwrap();
    let then = guid("7CB8F5316DA9E6203C78B4F12D69A5E0");
    let execute = guid("5D8AB7E5123F6C982D5A87B4E20F3C68");
    assert!(document.connect(
        ("K2Node_CallFunction_3", &then),
        ("K2Node_CallFunction_3", &execute)
    ));
    let then_pin = document.find_pin("K2Node_CallFunction_3", &then).unwrap();
    assert_eq!(document.linked_pins(then_pin).count(), 1);

    assert!(!document.connect(
        ("K2Node_CallFunction_3", &then),
        ("K2Node_Missing_9", &execute)
    ));

    let written = write_multiple(&document.objects).unwrap();
    assert!(written.contains("LinkedTo=(K2Node_CallFunction_3 5D8AB7E5123F6C982D5A87B4E20F3C68,)"));
    let reread = read_document(&written).unwrap();
    let then_pin = reread.find_pin("K2Node_CallFunction_3", &then).unwrap();
    assert!(then_pin.is_linked());
}

#[test]
fn test_comment_node() {
    let objects = read_multiple(&read_test_file("comment.t3d")).unwrap();
    assert_eq!(objects.len(), 1);
    let comment = &objects[0];
    assert_eq!(
        comment.get("NodeComment"),
        Some(&Value::from("Movement \"input\" handling"))
    );
    assert_eq!(comment.get("bColorCommentBubble"), Some(&Value::Boolean(true)));
    assert_eq!(comment.get("NodeWidth"), Some(&Value::Integer(832)));
    assert_eq!(comment.node_position(), Some((-512, -256)));
    assert!(comment.pins().is_empty());

    let written = write_multiple(&objects).unwrap();
    assert!(written.contains(r#"   NodeComment="Movement \"input\" handling""#));
}

#[test]
fn test_comment_text_is_not_sanitized() {
    let source = "Begin Object Class=/Script/UnrealEd.EdGraphNode_Comment Name=\"EdGraphNode_Comment_1\"\n   NodeComment=\"Set R=True here, A=(Expression= too, keep NaN\"\nEnd Object\n";
    let objects = read_multiple(source).unwrap();
    assert_eq!(
        objects[0].get("NodeComment"),
        Some(&Value::from("Set R=True here, A=(Expression= too, keep NaN"))
    );
    assert_eq!(write_multiple(&objects).unwrap(), source);
}

#[test]
fn test_duplicate_links_collapse_on_read() {
    let source = "Begin Object Class=/Script/BlueprintGraph.K2Node_Knot Name=\"K2Node_Knot_0\"\n   CustomProperties Pin (PinId=00000000000000000000000000000001,PinName=\"OutputPin\",Direction=\"EGPD_Output\",PinType.PinCategory=\"wildcard\",LinkedTo=(K2Node_Knot_1 00000000000000000000000000000002,K2Node_Knot_1 00000000000000000000000000000002,K2Node_Knot_2 00000000000000000000000000000003,),)\nEnd Object\n";
    let document = read_document(source).unwrap();
    let pin = &document.objects[0].pins()[0];
    let links: Vec<_> = pin.links().collect();
    assert_eq!(links.len(), 2);
    assert!(links[0].targets("K2Node_Knot_1", &guid("00000000000000000000000000000002")));
    assert!(links[1].targets("K2Node_Knot_2", &guid("00000000000000000000000000000003")));

    let written = write_multiple(&document.objects).unwrap();
    assert_eq!(written.matches("K2Node_Knot_1 ").count(), 1);
}

#[test]
fn test_material_sub_objects() {
    let objects = read_multiple(&read_test_file("material.t3d")).unwrap();
    assert_eq!(objects.len(), 2);

    let constant = &objects[0];
    assert_eq!(constant.sub_objects.len(), 1);
    let expression = &constant.sub_objects[0];
    assert_eq!(expression.name(), Some("MaterialExpressionConstant3Vector_0"));
    assert_eq!(
        expression.get("MaterialExpressionEditorX"),
        Some(&Value::Integer(-480))
    );
    let output = constant.find_pin_by_name("Output").unwrap();
    assert!(output.is_output());
    assert_eq!(output.category(), "mask");

    // Component mask flags keep their boolean meaning
    let mask = &objects[1].sub_objects[0];
    assert_eq!(mask.get("R"), Some(&Value::Boolean(true)));
    assert_eq!(mask.get("G"), Some(&Value::Boolean(true)));
    assert_eq!(mask.get("B"), None);
}

#[test]
fn test_material_write_keeps_mask_flags() {
    let source = read_test_file("material.t3d");
    let objects = read_multiple(&source).unwrap();
    let written = write_multiple(&objects).unwrap();
    assert!(written.contains("\n      R=True\n      G=True\n"));
    assert!(!written.contains("_UNT_"));
    assert!(written.contains(
        "   Begin Object Class=/Script/Engine.MaterialExpressionComponentMask Name=\"MaterialExpressionComponentMask_0\"\n"
    ));
}

#[test]
fn test_quirks_are_sanitized() {
    let objects = read_multiple(&read_test_file("quirks.t3d")).unwrap();
    let entry = &objects[0];
    assert_eq!(entry.get("LocalVariables"), None);
    assert_eq!(entry.get("ErrorType"), Some(&Value::Integer(0)));
    assert_eq!(entry.pins().len(), 1);
    let then = &entry.pins()[0];
    assert!(!then.is_linked());
    assert_eq!(then.pin_name(), "then");
}

#[test]
fn test_quirks_fail_without_sanitizing() {
    let options = Options {
        sanitize: false,
        ..Options::default()
    };
    assert!(read_multiple_with(&read_test_file("quirks.t3d"), &options).is_err());
}

#[test]
fn test_document_exports() {
    let document = read_document(&read_test_file("print_speed.t3d")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&document.to_json().unwrap()).unwrap();
    let objects = json["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 2);
    assert_eq!(objects[0]["name"], "K2Node_VariableGet_0");

    let yaml = document.to_yaml().unwrap();
    assert!(yaml.contains("K2Node_CallFunction_3"));
}
