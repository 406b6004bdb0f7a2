// libs/invitation-cell/src/services/template.rs
use chrono::{DateTime, Utc};

use consultation_cell::models::Meeting;
use consultation_cell::services::JoinLinkBuilder;

use crate::models::MailMessage;

pub const JOIN_INSTRUCTIONS: [&str; 4] = [
    "Open the link a few minutes before your appointment time.",
    "Use a recent version of Chrome, Firefox, Safari or Edge.",
    "Allow access to your camera and microphone when prompted.",
    "Find a quiet, private and well-lit place for the consultation.",
];

const SCHEDULE_FORMAT: &str = "%A, %B %-d, %Y at %H:%M UTC";

/// Everything an invitation shows, taken from the meeting when it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationTemplate {
    pub patient_name: String,
    pub doctor_name: String,
    pub consultation_label: String,
    pub schedule_text: String,
    pub duration_minutes: i32,
    pub join_url: String,
    pub short_url: String,
    pub expires_text: String,
    pub notes: Option<String>,
}

impl InvitationTemplate {
    pub fn for_meeting(meeting: &Meeting, links: &JoinLinkBuilder) -> Self {
        Self {
            patient_name: meeting.patient_name.clone(),
            doctor_name: meeting.doctor_name.clone(),
            consultation_label: meeting.consultation_type.label().to_string(),
            schedule_text: schedule_text(meeting.scheduled_time),
            duration_minutes: meeting.duration_minutes,
            join_url: links.invitation(meeting),
            short_url: links.short(meeting),
            expires_text: schedule_text(meeting.expires_at),
            notes: meeting.notes.clone().filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "Your video consultation with {} on {}",
            self.doctor_name, self.schedule_text
        )
    }

    pub fn text_body(&self) -> String {
        let mut body = format!(
            "Hello {},\n\n\
             Your {} with {} is scheduled for {} ({} minutes).\n\n\
             Join the consultation: {}\n\
             Short link: {}\n\n\
             This link is valid until {}.\n",
            self.patient_name,
            self.consultation_label,
            self.doctor_name,
            self.schedule_text,
            self.duration_minutes,
            self.join_url,
            self.short_url,
            self.expires_text,
        );

        if let Some(notes) = &self.notes {
            body.push_str(&format!("\nNotes from the clinic: {}\n", notes));
        }

        body.push_str("\nBefore you join:\n");
        for instruction in JOIN_INSTRUCTIONS {
            body.push_str(&format!("- {}\n", instruction));
        }

        body
    }

    pub fn html_body(&self) -> String {
        let notes = self
            .notes
            .as_deref()
            .map(|n| format!("<p><strong>Notes from the clinic:</strong> {}</p>", escape_html(n)))
            .unwrap_or_default();

        let instructions: String = JOIN_INSTRUCTIONS
            .iter()
            .map(|i| format!("<li>{}</li>", escape_html(i)))
            .collect();

        format!(
            "<html><body>\
             <p>Hello {patient},</p>\
             <p>Your {label} with {doctor} is scheduled for <strong>{schedule}</strong> ({duration} minutes).</p>\
             <p><a href=\"{join}\">Join the consultation</a></p>\
             <p>Short link: <a href=\"{short}\">{short}</a></p>\
             <p>This link is valid until {expires}.</p>\
             {notes}\
             <p>Before you join:</p><ul>{instructions}</ul>\
             </body></html>",
            patient = escape_html(&self.patient_name),
            label = escape_html(&self.consultation_label),
            doctor = escape_html(&self.doctor_name),
            schedule = escape_html(&self.schedule_text),
            duration = self.duration_minutes,
            join = escape_html(&self.join_url),
            short = escape_html(&self.short_url),
            expires = escape_html(&self.expires_text),
            notes = notes,
            instructions = instructions,
        )
    }

    pub fn to_message(&self, recipient: &str) -> MailMessage {
        MailMessage {
            to: recipient.to_string(),
            subject: self.subject(),
            text_body: self.text_body(),
            html_body: self.html_body(),
        }
    }
}

pub fn schedule_text(time: DateTime<Utc>) -> String {
    time.format(SCHEDULE_FORMAT).to_string()
}

fn escape_html(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '&' => "&amp;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#39;".to_string(),
            c => c.to_string(),
        })
        .collect()
}
