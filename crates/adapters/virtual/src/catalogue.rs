//! The reference device catalogue: every role of the three subsystems plus
//! the hub itself.

use nexushub_domain::device::{Device, DeviceKind, DeviceStatus};

/// id, name, kind, location, ip, protocol, value, powered
type Seed = (
    &'static str,
    &'static str,
    DeviceKind,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    bool,
);

const SEEDS: &[Seed] = &[
    ("1", "Sensor DHT22 Rack", DeviceKind::Sensor, "Rack Servidor", "192.168.1.21", "MQTT", "35.2 / 45%", true),
    ("2", "Anemómetro Rack", DeviceKind::Sensor, "Rack Servidor", "192.168.1.22", "MQTT", "1.5", true),
    ("3", "Extractor Rack", DeviceKind::Actuator, "Rack Servidor", "192.168.1.23", "MQTT", "65", true),
    ("4", "Relevador Corte Rack", DeviceKind::Actuator, "Rack Servidor", "192.168.1.24", "MQTT", "ENCENDIDO", true),
    ("5", "Hub Central Raspberry Pi", DeviceKind::Gateway, "Cuarto de control", "192.168.1.10", "HTTP", "N/A", true),
    ("6", "Cámara ESP32-CAM", DeviceKind::Camera, "Entrada principal", "192.168.1.31", "HTTP", "N/A", true),
    ("7", "Cerradura Caja", DeviceKind::Actuator, "Caja de paquetería", "192.168.1.32", "MQTT", "CERRADA", false),
    ("8", "Báscula Tapete", DeviceKind::Sensor, "Entrada principal", "192.168.1.33", "MQTT", "0", true),
    ("9", "Sensor Presión Caja", DeviceKind::Sensor, "Caja de paquetería", "192.168.1.34", "MQTT", "0", true),
    ("10", "Alarma Caja", DeviceKind::Actuator, "Caja de paquetería", "192.168.1.35", "MQTT", "SILENCIO", false),
    ("11", "Sensor ACS712", DeviceKind::Sensor, "Tablero eléctrico", "192.168.1.41", "MQTT", "1.1A / 253W", true),
    ("12", "Sensor MQ-2 Gas", DeviceKind::Sensor, "Cocina", "192.168.1.42", "MQTT", "12", true),
    ("13", "Relevador Sala", DeviceKind::Actuator, "Sala", "192.168.1.43", "MQTT", "ENCENDIDO", true),
    ("14", "Relevador Cocina", DeviceKind::Actuator, "Cocina", "192.168.1.44", "MQTT", "ENCENDIDO", true),
    ("15", "Válvula Gas", DeviceKind::Actuator, "Cocina", "192.168.1.45", "MQTT", "ABIERTA", false),
];

/// Build the catalogue. Every seed carries a non-empty id and name.
#[must_use]
pub fn catalogue() -> Vec<Device> {
    SEEDS
        .iter()
        .filter_map(|&(id, name, kind, location, ip, protocol, value, powered)| {
            Device::builder()
                .id(id)
                .name(name)
                .kind(kind)
                .location(location)
                .ip(ip)
                .protocol(protocol)
                .status(DeviceStatus::Online)
                .value(value)
                .powered(powered)
                .build()
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexushub_domain::category::SystemCategory;

    #[test]
    fn should_build_every_seed() {
        assert_eq!(catalogue().len(), SEEDS.len());
    }

    #[test]
    fn should_cover_every_category() {
        let devices = catalogue();
        for category in [
            SystemCategory::Rack,
            SystemCategory::Access,
            SystemCategory::Energy,
            SystemCategory::Hub,
        ] {
            assert!(
                devices.iter().any(|d| SystemCategory::of(d) == category),
                "no device in {category}"
            );
        }
    }
}
