//! UI Components

use leptos::prelude::*;

use crate::api::{ChatMessage, ToolSummary};

/// Message bubble component
#[component]
pub fn MessageBubble(message: ChatMessage) -> impl IntoView {
    let class = format!("message message-{}", message.role);

    view! {
        <div class=class>
            <span class="role">{message.role.clone()}</span>
            <p class="content">{message.content.clone()}</p>
        </div>
    }
}

/// `name: description` list for one agent's catalog
#[component]
pub fn ToolList(title: &'static str, tools: Vec<ToolSummary>) -> impl IntoView {
    view! {
        <div class="tool-list">
            <h4>{title}</h4>
            <ul>
                {tools
                    .into_iter()
                    .map(|tool| view! {
                        <li><code>{tool.name}</code>": "{tool.description}</li>
                    })
                    .collect_view()}
            </ul>
        </div>
    }
}

#[component]
pub fn SetupInstructions() -> impl IntoView {
    view! {
        <section class="setup">
            <h3>"Setup Instructions"</h3>
            <ol>
                <li>"Start calculator server:"<pre>"cargo run --bin calculator-server"</pre></li>
                <li>"Start weather server:"<pre>"cargo run --bin weather-server"</pre></li>
                <li>"Click \"Reinitialize Agents\""</li>
            </ol>
        </section>
    }
}

#[component]
pub fn ExampleQueries() -> impl IntoView {
    view! {
        <section class="examples">
            <h3>"Example Queries"</h3>
            <h4>"Calculator:"</h4>
            <ul>
                <li>"What is 15 + 27?"</li>
                <li>"Multiply 8 and 12"</li>
                <li>"Calculate 5 to the power of 3"</li>
            </ul>
            <h4>"Weather:"</h4>
            <ul>
                <li>"What's the weather in Tokyo?"</li>
                <li>"Get 3-day forecast for London"</li>
                <li>"Convert 25°C to Fahrenheit"</li>
                <li>"Weather alerts for New York"</li>
            </ul>
        </section>
    }
}
