use power_index::bignum::primes::select_primes;
use power_index::bignum::{bound_of_width, new_calculator, Backend, IntRepresentation, Operation};

fn usage() -> ! {
    eprintln!("Usage: calculator_info <bound-bits> [addition|multiplication] [auto|bigint|primes|native]");
    std::process::exit(2);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        usage();
    }

    let bits: u32 = match args[1].parse() {
        Ok(b) => b,
        Err(_) => usage(),
    };
    let op: Operation = match args.get(2).map(|s| s.parse()).transpose() {
        Ok(op) => op.unwrap_or(Operation::Addition),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let repr: IntRepresentation = match args.get(3).map(|s| s.parse()).transpose() {
        Ok(r) => r.unwrap_or_default(),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let bound = match bound_of_width(bits) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{e}");
            usage();
        }
    };
    let info = select_primes(&bound, op);
    let calc = match new_calculator(&bound, op, repr) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("No calculator: {e}");
            std::process::exit(1);
        }
    };

    let out = serde_json::json!({
        "bound_bits": bits,
        "operation": op,
        "representation": repr,
        "backend": calc.kind(),
        "element_size": calc.element_size(),
        "primes": calc.primes(),
        "selector": {
            "native": info.is_native(),
            "primes": info.amount(),
            "capacity_bits": info.capacity().bits(),
        },
    });
    match serde_json::to_string_pretty(&out) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Failed to serialize result: {e}");
            std::process::exit(1);
        }
    }
}
