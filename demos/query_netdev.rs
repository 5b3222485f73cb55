use std::env;

use genl_netdev::{
    err::NetdevError,
    netdev::{Netdev, NetdevClass},
};

// This example queries a single device from the netdev family and prints the attributes that
// were cached for it. The device name defaults to "eth0".

fn main() -> Result<(), NetdevError> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "eth0".to_string());
    let class = args
        .next()
        .and_then(|class| NetdevClass::from_type_name(&class))
        .unwrap_or(NetdevClass::System);

    let netdev = match Netdev::open(name, class) {
        Ok(netdev) => netdev,
        Err(e) => {
            eprintln!("Query failed with errno {}: {}", e.errno(), e);
            return Err(e);
        }
    };

    println!("{} ({})", netdev.name(), netdev.class().type_name());
    println!("\tvport type: {:?}", netdev.dev_type());
    println!("\tport: {}", netdev.port_no());
    println!("\tmac: {}", netdev.etheraddr()?);
    println!("\tmtu: {}", netdev.mtu()?);
    println!("\tflags: {:?}", netdev.ifi_flags()?);

    netdev.destruct();
    Ok(())
}
