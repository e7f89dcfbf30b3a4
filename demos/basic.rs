use condstyle::{parse, Props, Scheme};

fn main() {
    tracing_subscriber::fmt::init();

    // Rewrite a stylesheet and register its conditions
    let mut scheme = Scheme::new("button");
    let css = parse(
        "color: if(size == 'large', red, blue);\nopacity: if(!disabled, 1, 0.5);",
        &mut scheme,
    )
    .expect("failed to parse stylesheet");

    println!("{css}");

    let mut compiled = scheme.prepare_styles();
    println!("{compiled}");
    println!("{}", compiled.base());

    // Serialize a property bag into cache keys
    let props = Props::new().set("size", "large").set("disabled", false);
    let out = compiled
        .serialize(&props)
        .expect("props reference unknown properties");

    for key in out.matched.split(' ') {
        if let Some(block) = compiled.block(key) {
            println!("{block}");
        }
    }
}
