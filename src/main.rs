use std::collections::HashMap;

use liquid_glass::EffectController;

fn main() {
    env_logger::init();

    // Attributes arrive as `key=value` pairs, exactly as a host wrapper would forward them
    // from the element's attribute map.  Unknown keys are ignored by the resolver.
    let attrs: HashMap<String, String> = std::env::args()
        .skip(1)
        .filter_map(|arg| {
            let (key, value) = arg.split_once('=')?;
            Some((key.to_owned(), value.to_owned()))
        })
        .collect();

    let mut controller = EffectController::new();
    controller.notify(&attrs);
    println!("{}", controller.filter_document());
}
