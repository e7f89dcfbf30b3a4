use condstyle::{
    parse, CompareOp, CompileError, CompiledScheme, Fact, Literal, Operand, Parser, Props, Scheme,
};

fn compile(source: &str) -> (String, CompiledScheme) {
    let mut scheme = Scheme::new("button");
    let css = parse(source, &mut scheme).unwrap();
    (css, scheme.prepare_styles())
}

fn declarations(scheme: &mut CompiledScheme, props: &Props) -> String {
    let out = scheme.serialize(props).unwrap();
    scheme.block(&out.matched).unwrap().declarations.clone()
}

// ---------------------------------------------------------------------------
// Equality against a string literal
// ---------------------------------------------------------------------------

#[test]
fn equality_directive_end_to_end() {
    let mut scheme = Scheme::new("button");
    let css = parse("color: if(size == 'large', red, blue);", &mut scheme).unwrap();
    assert_eq!(
        css,
        "color: var(--size≡´large´,red) var(--size≠´large´,blue);"
    );
    assert!(scheme.has_condition(&Fact::compare(
        "size",
        CompareOp::Eq,
        Operand::Literal(Literal::string("large")),
    )));

    let mut compiled = scheme.prepare_styles();
    assert_eq!(
        declarations(&mut compiled, &Props::new().set("size", "large")),
        "--size≡´large´:initial;\n--size≠´large´: ;"
    );
    assert_eq!(
        declarations(&mut compiled, &Props::new().set("size", "small")),
        "--size≡´large´: ;\n--size≠´large´:initial;"
    );
}

// ---------------------------------------------------------------------------
// Bare truthiness
// ---------------------------------------------------------------------------

#[test]
fn negated_truthiness_end_to_end() {
    let (css, mut compiled) = compile("visibility: if(!disabled, visible, hidden);");
    assert_eq!(
        css,
        "visibility: var(--¬disabled,visible) var(--disabled,hidden);"
    );
    assert_eq!(
        declarations(&mut compiled, &Props::new().set("disabled", false)),
        "--disabled: ;\n--¬disabled:initial;"
    );
    assert_eq!(
        declarations(&mut compiled, &Props::new().set("disabled", true)),
        "--disabled:initial;\n--¬disabled: ;"
    );
}

// ---------------------------------------------------------------------------
// Compound tests
// ---------------------------------------------------------------------------

#[test]
fn compound_directive_end_to_end() {
    let mut scheme = Scheme::new("button");
    let css = parse("if(a && b, X, Y)", &mut scheme).unwrap();
    assert_eq!(css, "var(--if-a∧b,X) var(--else-a∧b,Y)");
    assert_eq!(
        scheme.prepared_conditions().collect::<Vec<_>>(),
        [
            ("else-a∧b", "var(--¬a) var(--¬b)"),
            ("if-a∧b", "var(--a,var(--b))"),
        ]
    );

    let compiled = scheme.prepare_styles();
    assert_eq!(
        compiled.base().declarations,
        "--else-a∧b:var(--¬a) var(--¬b);\n\
         --if-a∧b:var(--a,var(--b));\n\
         --a: ;\n--¬a:initial;\n\
         --b: ;\n--¬b:initial;"
    );
}

#[test]
fn compound_leaves_feed_per_property_blocks() {
    let (_, mut compiled) = compile("if(a || n > 2, X)");
    assert_eq!(
        declarations(&mut compiled, &Props::new().set("a", true)),
        "--a:initial;"
    );
    assert_eq!(
        declarations(&mut compiled, &Props::new().set("n", 3)),
        "--n⋗2:initial;"
    );
    assert_eq!(declarations(&mut compiled, &Props::new().set("n", 1)), "");
}

#[test]
fn distinct_operands_get_distinct_flags() {
    let (css, mut compiled) = compile("if(s == 'x y', a) if(s == 'x␣y', b)");
    assert_eq!(css, "var(--s≡´x␣y´,a) var(--s≡´x\\␣y´,b)");
    assert_eq!(
        declarations(&mut compiled, &Props::new().set("s", "x y")),
        "--s≡´x␣y´:initial;\n--s≠´x␣y´: ;\n--s≡´x\\␣y´: ;\n--s≠´x\\␣y´:initial;"
    );
}

// ---------------------------------------------------------------------------
// Unregistered properties
// ---------------------------------------------------------------------------

#[test]
fn unregistered_property_is_an_error() {
    let (_, mut compiled) = compile("if(size == 'large', red, blue)");
    let err = compiled
        .serialize(&Props::new().set("colour", "red"))
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::UnregisteredProperty {
            scheme: "button".into(),
            property: "colour".into(),
        }
    );
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

#[test]
fn serialize_is_deterministic_and_generates_once() {
    let (_, mut compiled) = compile("if(size == 'large', a, b) if(!disabled, c)");
    let props = Props::new().set("size", "large").set("disabled", false);

    let first = compiled.serialize(&props).unwrap();
    let blocks = compiled.blocks().len();
    let second = compiled.serialize(&props).unwrap();
    assert_eq!(first, second);
    assert_eq!(compiled.blocks().len(), blocks);
    assert_eq!(first.matched.split(' ').count(), 2);
}

#[test]
fn values_sharing_a_key_share_a_block() {
    let (_, mut compiled) = compile("if(label, a, b)");
    let empty = compiled.serialize(&Props::new().set("label", "")).unwrap();
    let undefined = compiled
        .serialize(&Props::new().set("label", condstyle::Value::Undefined))
        .unwrap();
    assert_eq!(empty, undefined);
}

#[test]
fn shared_key_blocks_do_not_depend_on_arrival_order() {
    let source = "if(v == String, a, b) if(w == null, c, d)";
    let block_for = |first: &Props, second: &Props| {
        let (_, mut compiled) = compile(source);
        compiled.serialize(first).unwrap();
        let out = compiled.serialize(second).unwrap();
        compiled.block(&out.matched).unwrap().declarations.clone()
    };
    let empty = |name: &str| Props::new().set(name, "");
    let undefined = |name: &str| Props::new().set(name, condstyle::Value::Undefined);

    let v = block_for(&empty("v"), &undefined("v"));
    assert_eq!(v, block_for(&undefined("v"), &undefined("v")));
    assert_eq!(v, block_for(&undefined("v"), &empty("v")));
    assert_eq!(v, "--v≡String: ;\n--v≠String:initial;");

    let w = block_for(&undefined("w"), &empty("w"));
    assert_eq!(w, block_for(&empty("w"), &empty("w")));
    assert_eq!(w, "--w≡null:initial;\n--w≠null: ;");
}

#[test]
fn functions_compare_equal_in_dependent_blocks() {
    use condstyle::Value;

    let (_, mut compiled) = compile("if(onA == onB, x, y)");
    let same = Props::new()
        .set("onA", Value::Function("f".into()))
        .set("onB", Value::Function("f".into()));
    let different = Props::new()
        .set("onA", Value::Function("f".into()))
        .set("onB", Value::Function("g".into()));

    let first = compiled.serialize(&different).unwrap();
    let second = compiled.serialize(&same).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        compiled.block(&first.dependencies[0]).unwrap().declarations,
        "--onA≡onB:initial;\n--onA≠onB: ;"
    );
}

#[test]
fn flush_returns_new_blocks_once() {
    let (_, mut compiled) = compile("if(size == 'large', a, b)");
    let base_key = compiled.base_key().to_owned();
    let initial: Vec<_> = compiled.flush().iter().map(|b| b.key.clone()).collect();
    assert_eq!(initial, [base_key]);

    compiled
        .serialize(&Props::new().set("size", "large"))
        .unwrap();
    compiled
        .serialize(&Props::new().set("size", "small"))
        .unwrap();
    assert_eq!(compiled.flush().len(), 2);
    assert!(compiled.flush().is_empty());
}

// ---------------------------------------------------------------------------
// Dependent rules
// ---------------------------------------------------------------------------

#[test]
fn property_operands_produce_dependency_blocks() {
    let (css, mut compiled) = compile("if(min <= value, in, out)");
    assert_eq!(css, "var(--min⋜value,in) var(--min⋗value,out)");

    let out = compiled
        .serialize(&Props::new().set("min", 1).set("value", 2))
        .unwrap();
    assert!(out.matched.is_empty());
    assert_eq!(out.dependencies.len(), 1);
    assert_eq!(
        compiled.block(&out.dependencies[0]).unwrap().declarations,
        "--min⋜value:initial;"
    );

    let other = compiled
        .serialize(&Props::new().set("min", 3).set("value", 2))
        .unwrap();
    assert_ne!(other.dependencies, out.dependencies);
    assert_eq!(
        compiled.block(&other.dependencies[0]).unwrap().declarations,
        "--min⋗value:initial;"
    );
}

// ---------------------------------------------------------------------------
// Reuse across sources
// ---------------------------------------------------------------------------

#[test]
fn conditions_accumulate_across_parses() {
    let mut scheme = Scheme::new("card");
    let mut parser = Parser::new();
    parser.parse("if(a, x)", &mut scheme).unwrap();
    parser.parse("if(b == 2, y)", &mut scheme).unwrap();
    assert_eq!(scheme.properties().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn custom_options_flow_into_blocks() {
    let mut scheme = Scheme::builder("chip")
        .on("on")
        .off("off")
        .key_prefix("chip-")
        .build();
    parse("if(active, bold)", &mut scheme).unwrap();
    let mut compiled = scheme.prepare_styles();
    let out = compiled
        .serialize(&Props::new().set("active", true))
        .unwrap();
    assert!(out.matched.starts_with("chip-"));
    assert_eq!(
        compiled.block(&out.matched).unwrap().declarations,
        "--active:on;"
    );
    assert!(compiled.base_key().starts_with("chip-"));
}
