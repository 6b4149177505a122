//! `route` and `routes` commands: inspect the FIB built from static routes.

use anyhow::{Context, Result};
use log::info;
use ndnfw_common::Name;
use ndnfw_core::{Fib, FibEntry, ForwarderConfig};

fn build_fib(config: &ForwarderConfig) -> Result<Fib> {
    let mut fib = Fib::new();
    for (prefix, face, cost) in config.parsed_routes().context("Invalid route in configuration")? {
        fib.add_or_update_next_hop(&prefix, face, cost);
    }
    Ok(fib)
}

fn print_next_hops(entry: &FibEntry) {
    for nh in entry.next_hops() {
        println!("  face {} cost {}", nh.face.0, nh.cost);
    }
}

/// Print the longest-prefix match for `name`
pub fn resolve(config: &ForwarderConfig, name: &str) -> Result<()> {
    let name = Name::from_uri(name).with_context(|| format!("Invalid name: {}", name))?;
    let fib = build_fib(config)?;
    info!("Resolving {} against {} FIB entries", name, fib.len());

    let entry = fib.find_longest_prefix_match(&name);
    if !entry.has_next_hops() {
        println!("{} -> no route", name);
        return Ok(());
    }

    println!("{} -> {}", name, entry.prefix());
    print_next_hops(entry);
    Ok(())
}

/// Print every FIB entry in name order
pub fn list(config: &ForwarderConfig) -> Result<()> {
    let fib = build_fib(config)?;
    let mut entries: Vec<&FibEntry> = fib.iter().filter(|e| e.has_next_hops()).collect();
    entries.sort_by(|a, b| a.prefix().cmp(b.prefix()));

    if entries.is_empty() {
        println!("No routes configured");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.prefix());
        print_next_hops(entry);
    }
    Ok(())
}
