//! ZTE ZXA10 model variants.
//!
//! The C300 and C320 share the ZXA10 CLI command set; they differ in the
//! ONU vendors seen in the field (serial-prefix table) and in the
//! optical-info output format, which is not stable across firmware. New
//! models plug in by implementing [`OltModel`](super::OltModel) and
//! taking a row in the factory table.

mod c300;
mod c320;

pub use c300::ZxaC300;
pub use c320::ZxaC320;

use super::ProvisionRequest;

/// Fixed TCONT index used for the single-service provisioning shape.
const TCONT_ID: u32 = 1;

/// Fixed GEM port bound to that TCONT.
const GEMPORT_ID: u32 = 1;

/// Fixed virtual port carrying the service VLAN.
const VPORT_ID: u32 = 1;

/// Longest ONU name the CLI accepts.
const MAX_NAME_LEN: usize = 32;

/// The ZXA10 register sequence. Order matters: the CLI nests
/// configuration modes, and each `interface`/`exit` pair moves between
/// them.
pub(super) fn zxa10_register_commands(request: &ProvisionRequest) -> Vec<String> {
    let mut commands = Vec::with_capacity(12);

    commands.push("configure terminal".to_string());

    commands.push(format!("interface gpon-olt_{}", request.pon_port));
    commands.push(format!(
        "onu {} type auto sn {}",
        request.onu_id, request.serial_number
    ));
    commands.push("exit".to_string());

    commands.push(format!(
        "interface gpon-onu_{}:{}",
        request.pon_port, request.onu_id
    ));

    if !request.name.is_empty() {
        commands.push(format!("name {}", sanitize_name(&request.name)));
    }

    commands.push(format!("tcont {TCONT_ID} profile {}", request.line_profile));
    commands.push(format!("gemport {GEMPORT_ID} tcont {TCONT_ID}"));

    commands.push(format!("switchport mode trunk vport {VPORT_ID}"));
    commands.push(format!(
        "service-port {} vport {VPORT_ID} user-vlan {vlan} vlan {vlan}",
        request.service_port.unwrap_or(1),
        vlan = request.vlan
    ));

    commands.push("exit".to_string());
    commands.push("exit".to_string());

    commands
}

/// The inverse sequence: unbind the ONU from its PON port.
pub(super) fn zxa10_delete_commands(pon_port: &str, onu_id: u32) -> Vec<String> {
    vec![
        "configure terminal".to_string(),
        format!("interface gpon-olt_{pon_port}"),
        format!("no onu {onu_id}"),
        "exit".to_string(),
        "exit".to_string(),
    ]
}

/// The CLI rejects spaces in names and silently truncates long ones;
/// sanitize up front so the sent command matches what sticks.
fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_").chars().take(MAX_NAME_LEN).collect()
}
