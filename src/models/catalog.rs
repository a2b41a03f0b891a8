use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Service {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const SERVICES: &[Service] = &[
    Service {
        id: "house-cleaning",
        title: "Cleaning Services",
        description: "Emergency cleaning when you need a spotless space right away.",
    },
    Service {
        id: "general-labor",
        title: "General Labor",
        description: "Extra hands for moving, setup and day-to-day tasks.",
    },
    Service {
        id: "event-assistant",
        title: "Event Assistant",
        description: "Keeps your event clean and organized from start to finish.",
    },
];

pub const TIME_SLOTS: &[&str] = &[
    "8:00 AM", "9:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "1:00 PM", "2:00 PM", "3:00 PM",
    "4:00 PM",
];

pub fn find_service(title: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|s| s.title == title)
}
