//! Integration test cases.

use colored::Colorize;
use futures::executor::block_on;
use xbee_modem::{Callbacks, CommandError, DeliveryStatus, LrPacket, Radio, XBeeLr};

use crate::device::SerialTransport;

/// Prints every callback the driver makes.
pub struct Printer;

impl Callbacks for Printer {
    fn on_receive(&mut self, packet: &LrPacket<'_>) {
        println!(
            "    {} port {} rssi {} snr {}: {:02x?}",
            "RX".cyan(),
            packet.port,
            packet.rssi,
            packet.snr,
            packet.payload
        );
    }

    fn on_send(&mut self, packet: &LrPacket<'_>) {
        println!(
            "    {} frame {} status 0x{:02x}",
            "TX".cyan(),
            packet.frame_id,
            packet.status
        );
    }

    fn on_connect(&mut self) {
        println!("    {} joined", "LINK".cyan());
    }

    fn on_disconnect(&mut self) {
        println!("    {} left", "LINK".cyan());
    }
}

pub type Modem = XBeeLr<SerialTransport, Printer>;

/// What the runner was asked to exercise.
pub struct TestOptions {
    pub app_eui: Option<String>,
    pub app_key: Option<String>,
    pub nwk_key: Option<String>,
    pub join: bool,
    pub uplink_port: u8,
}

/// Test result.
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

impl TestResult {
    fn pass() -> Self {
        Self {
            name: String::new(),
            passed: true,
            message: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            name: String::new(),
            passed: false,
            message: Some(message.to_string()),
        }
    }
}

/// Run a test function and print results as it happens.
fn run_test<F>(name: &str, modem: &mut Modem, test_fn: F) -> TestResult
where
    F: FnOnce(&mut Modem) -> TestResult,
{
    print!("  {} ... ", name);
    std::io::Write::flush(&mut std::io::stdout()).ok();

    let mut result = test_fn(modem);
    result.name = name.to_string();

    if result.passed {
        println!("{}", "PASS".green().bold());
    } else {
        println!("{}", "FAIL".red().bold());
        if let Some(msg) = &result.message {
            println!("    {}", msg.red());
        }
    }

    result
}

/// Run all tests and return results.
pub fn run_all_tests(modem: &mut Modem, options: &TestOptions) -> Vec<TestResult> {
    let mut results = Vec::new();

    results.push(run_test("VR returns firmware version", modem, test_firmware_version));
    results.push(run_test("DE returns device EUI", modem, test_dev_eui));
    results.push(run_test("Malformed key rejected before sending", modem, test_bad_key));

    if let Some(app_eui) = &options.app_eui {
        results.push(run_test("AE accepts application EUI", modem, |m| {
            expect_ok(block_on(m.set_app_eui(app_eui)))
        }));
    }
    if let Some(app_key) = &options.app_key {
        results.push(run_test("AK accepts application key", modem, |m| {
            expect_ok(block_on(m.set_app_key(app_key)))
        }));
    }
    if let Some(nwk_key) = &options.nwk_key {
        results.push(run_test("NK accepts network key", modem, |m| {
            expect_ok(block_on(m.set_nwk_key(nwk_key)))
        }));
    }

    results.push(run_test("WR and AC succeed", modem, test_write_and_apply));

    if options.join {
        let joined = run_test("Join network", modem, test_join);
        let can_send = joined.passed;
        results.push(joined);

        if can_send {
            let port = options.uplink_port;
            results.push(run_test("Uplink is delivered", modem, |m| test_uplink(m, port)));
        }
    }

    results
}

/// Print test results summary.
pub fn print_results(results: &[TestResult]) {
    println!("\n{}", "=".repeat(60));
    println!("{}", "Test Results".bold());
    println!("{}", "=".repeat(60));

    let mut passed = 0;
    let mut failed = 0;

    for result in results {
        if result.passed {
            println!("  {} {}", "[PASS]".green().bold(), result.name);
            passed += 1;
        } else {
            println!("  {} {}", "[FAIL]".red().bold(), result.name);
            if let Some(msg) = &result.message {
                println!("         {}", msg.red());
            }
            failed += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "  Total: {} passed, {} failed",
        passed.to_string().green(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        }
    );
    println!("{}", "=".repeat(60));
}

fn expect_ok(result: Result<(), CommandError>) -> TestResult {
    match result {
        Ok(()) => TestResult::pass(),
        Err(e) => TestResult::fail(&format!("Error: {}", e)),
    }
}

// --- Individual Tests ---

fn test_firmware_version(modem: &mut Modem) -> TestResult {
    match block_on(modem.firmware_version()) {
        Ok(version) => {
            print!("(0x{:X}) ", version);
            TestResult::pass()
        }
        Err(e) => TestResult::fail(&format!("Error: {}", e)),
    }
}

fn test_dev_eui(modem: &mut Modem) -> TestResult {
    let mut buf = [0u8; 17];
    match block_on(modem.get_dev_eui_hex(&mut buf)) {
        Ok(eui) if eui.chars().all(|c| c == '0') => {
            TestResult::fail("Device EUI is all zeros")
        }
        Ok(eui) => {
            print!("({}) ", eui);
            TestResult::pass()
        }
        Err(e) => TestResult::fail(&format!("Error: {}", e)),
    }
}

fn test_bad_key(modem: &mut Modem) -> TestResult {
    match block_on(modem.set_app_key("not a key")) {
        Err(CommandError::InvalidParameter) => TestResult::pass(),
        Ok(()) => TestResult::fail("Malformed key was accepted"),
        Err(e) => TestResult::fail(&format!("Expected InvalidParameter, got {}", e)),
    }
}

fn test_write_and_apply(modem: &mut Modem) -> TestResult {
    if let Err(e) = block_on(modem.write_config()) {
        return TestResult::fail(&format!("WR failed: {}", e));
    }
    expect_ok(block_on(modem.apply_changes()))
}

fn test_join(modem: &mut Modem) -> TestResult {
    if block_on(modem.connect()) {
        TestResult::pass()
    } else {
        TestResult::fail(&format!("Not joined; state {:?}", modem.state()))
    }
}

fn test_uplink(modem: &mut Modem, port: u8) -> TestResult {
    let payload = *b"xbee-modem";
    let mut packet = LrPacket::new(port, &payload).with_ack(true);

    match block_on(modem.send_data(&mut packet)) {
        Ok(DeliveryStatus::Success) => {
            // Give any downlink a chance to arrive
            for _ in 0..20 {
                let _ = block_on(modem.process());
            }
            TestResult::pass()
        }
        Ok(status) => TestResult::fail(&format!(
            "Frame {} delivery status 0x{:02x}",
            packet.frame_id,
            status.as_byte()
        )),
        Err(e) => TestResult::fail(&format!("Error: {}", e)),
    }
}
