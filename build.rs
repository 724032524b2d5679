fn main() {
    // Host builds (unit and integration tests) link normally; only the
    // firmware image needs the esp-hal linker scripts.
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_FIRMWARE");
    if std::env::var_os("CARGO_FEATURE_FIRMWARE").is_none() {
        return;
    }

    linker_be_nice();
    // make sure linkall.x is the last linker script (otherwise might cause problems with flip-link)
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

fn linker_be_nice() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 2 {
        let kind = &args[1];
        let what = &args[2];

        match kind.as_str() {
            "undefined-symbol" => match what.as_str() {
                "_defmt_timestamp" => {
                    eprintln!();
                    eprintln!("💡 `defmt` not found - make sure `defmt.x` is added as a linker script and you have included `use defmt_rtt as _;`");
                    eprintln!();
                }
                "_stack_start" => {
                    eprintln!();
                    eprintln!("💡 Is the linker script `linkall.x` missing?");
                    eprintln!();
                }
                "__embassy_time_queue_item_from_waker" | "_embassy_time_schedule_wake" => {
                    eprintln!();
                    eprintln!("💡 `embassy-time` has no time driver. Make sure `esp_hal_embassy::init` is called and the `firmware` feature is enabled.");
                    eprintln!();
                }
                _ => (),
            },
            // we don't have anything helpful for "missing-lib" yet
            _ => {
                std::process::exit(1);
            }
        }

        std::process::exit(0);
    }

    if let Ok(exe) = std::env::current_exe() {
        println!(
            "cargo:rustc-link-arg=--error-handling-script={}",
            exe.display()
        );
    }
}
