//! Public storefront content shown when the admin area is closed.

pub const SHOP_NAME: &str = "TecCell Premium";

pub const HEADLINE: &str = "Professional Apple logic board repair";

pub const TAGLINE: &str = "We diagnose and repair iPhone, iPad and MacBook logic boards \
with microscopic precision, using current equipment and original components.";

pub struct Service {
    pub title: &'static str,
    pub description: &'static str,
}

pub const SERVICES: &[Service] = &[
    Service {
        title: "iPhone repair",
        description: "Logic board specialists: charging, touch, camera, Face ID and more.",
    },
    Service {
        title: "iPad repair",
        description: "Full diagnosis and repair: touch, charging, buttons and connectivity.",
    },
    Service {
        title: "MacBook repair",
        description: "Boot failures, keyboard, trackpad and connector repairs.",
    },
    Service {
        title: "Liquid damage",
        description: "Ultrasonic cleaning and component replacement after spills.",
    },
    Service {
        title: "Charging problems",
        description: "Connector, circuit and power component diagnosis and repair.",
    },
    Service {
        title: "Micro-soldering",
        description: "IC, capacitor and SMD component replacement under the microscope.",
    },
];

pub struct ContactLine {
    pub label: &'static str,
    pub value: &'static str,
}

pub const CONTACT: &[ContactLine] = &[
    ContactLine {
        label: "Phone",
        value: "(11) 99999-9999",
    },
    ContactLine {
        label: "WhatsApp",
        value: "(11) 99999-9999",
    },
    ContactLine {
        label: "Address",
        value: "Avenida Prefeito Pedro Paschoal, 1322 - Ribeirão Preto/SP",
    },
];

pub const OPENING_HOURS: &[(&str, &str)] = &[
    ("Monday to Friday", "09:00 - 18:00"),
    ("Saturday", "09:00 - 14:00"),
    ("Sunday", "Closed"),
];
