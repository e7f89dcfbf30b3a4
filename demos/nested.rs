use condstyle::{parse, Props, Scheme};

fn main() {
    tracing_subscriber::fmt::init();

    let mut scheme = Scheme::builder("card").key_prefix("card-").build();
    let css = parse(
        "border: if(active && (hover || focus), if(dark, white, black) solid, none);\n\
         width: if(min <= value, auto, 0);",
        &mut scheme,
    )
    .expect("failed to parse stylesheet");

    println!("{css}");
    println!();
    for (name, value) in scheme.prepared_conditions() {
        println!("--{name}: {value}");
    }
    println!();

    let mut compiled = scheme.prepare_styles();
    let bags = [
        Props::new().set("active", true).set("hover", true).set("dark", true),
        Props::new().set("active", true).set("focus", false),
        Props::new().set("min", 1).set("value", 3),
    ];
    for props in &bags {
        let out = compiled
            .serialize(props)
            .expect("props reference unknown properties");
        println!("matched: {:?} dependencies: {:?}", out.matched, out.dependencies);
    }

    // Only blocks not written yet
    println!();
    for block in compiled.flush() {
        println!("{block}");
    }
}
