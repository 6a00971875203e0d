//! Chat Page

use leptos::prelude::*;

use crate::api::{self, Readiness, SessionSnapshot};
use crate::components::{ExampleQueries, MessageBubble, SetupInstructions, ToolList};

#[component]
pub fn ChatPage() -> impl IntoView {
    let (session, set_session) = signal(None::<SessionSnapshot>);
    let (input, set_input) = signal(String::new());
    let (mode, set_mode) = signal(String::from("calculator"));
    let (loading, set_loading) = signal(false);
    let (error, set_error) = signal(None::<String>);
    let (show_debug, set_show_debug) = signal(false);

    let apply = move |result: Result<SessionSnapshot, String>| match result {
        Ok(snapshot) => {
            set_error.set(None);
            set_session.set(Some(snapshot));
        }
        Err(e) => set_error.set(Some(e)),
    };

    // One session per page load
    set_loading.set(true);
    leptos::task::spawn_local(async move {
        apply(api::create_session().await);
        set_loading.set(false);
    });

    // Tab close and reload never run `on_cleanup`
    let unload = window_event_listener(leptos::ev::pagehide, move |ev| {
        // A page kept in the back-forward cache may come back; idle eviction covers it
        if ev.persisted() {
            return;
        }
        if let Some(id) = session.get_untracked().map(|s| s.id) {
            api::close_session_on_unload(&id);
        }
    });

    on_cleanup(move || {
        unload.remove();
        if let Some(id) = session.get_untracked().map(|s| s.id) {
            leptos::task::spawn_local(async move {
                let _ = api::close_session(&id).await;
            });
        }
    });

    let session_id = move || session.get().map(|s| s.id);

    let send = move |()| {
        let msg = input.get();
        let Some(id) = session_id() else { return };
        if msg.trim().is_empty() || loading.get() {
            return;
        }

        set_input.set(String::new());
        set_loading.set(true);

        let selected = mode.get();
        leptos::task::spawn_local(async move {
            apply(api::send_message(&id, &msg, &selected).await.map(|r| r.session));
            set_loading.set(false);
        });
    };

    let clear = move |_| {
        let Some(id) = session_id() else { return };
        leptos::task::spawn_local(async move {
            apply(api::clear_chat(&id).await);
        });
    };

    let reinitialize = move |_| {
        let Some(id) = session_id() else { return };
        set_loading.set(true);
        leptos::task::spawn_local(async move {
            apply(api::reinitialize(&id).await);
            set_loading.set(false);
        });
    };

    let status = move || {
        session.get().map_or_else(
            || ("status info", "Connecting to MCP servers...".to_string()),
            |s| {
                let class = match s.status {
                    Readiness::Ready => "status success",
                    Readiness::Failed { .. } => "status error",
                    Readiness::Uninitialized | Readiness::Initializing => "status info",
                };
                (class, s.status_message)
            },
        )
    };

    view! {
        <div class="chat">
            <aside class="sidebar">
                <SetupInstructions />

                <div class="field">
                    <label>"Choose Agent:"</label>
                    <select on:change=move |ev| set_mode.set(event_target_value(&ev))>
                        <option value="calculator">"Calculator Agent"</option>
                        <option value="weather">"Weather Agent"</option>
                        <option value="auto">"Auto-Detect"</option>
                    </select>
                </div>

                <Show when=move || session.get().is_some_and(|s| s.status == Readiness::Ready)>
                    <section class="tools">
                        <h3>"Available Tools"</h3>
                        {move || session.get().map(|s| view! {
                            <ToolList title="🧮 Calculator Tools:" tools=s.tools.calculator />
                            <ToolList title="🌤️ Weather Tools:" tools=s.tools.weather />
                        })}
                    </section>
                </Show>

                <ExampleQueries />

                <button class="btn" on:click=clear>"Clear Chat"</button>
                <button class="btn" on:click=reinitialize disabled=move || loading.get()>
                    "Reinitialize Agents"
                </button>

                <label class="checkbox">
                    <input
                        type="checkbox"
                        prop:checked=move || show_debug.get()
                        on:change=move |ev| set_show_debug.set(event_target_checked(&ev))
                    />
                    "Show Debug Info"
                </label>

                <Show when=move || show_debug.get()>
                    <section class="debug">
                        <h3>"Debug Information"</h3>
                        {move || session.get().map(|s| view! {
                            <p>{format!("Calculator Agent: {}", s.calculator_ready)}</p>
                            <p>{format!("Weather Agent: {}", s.weather_ready)}</p>
                            <p>{format!("Chat history length: {}", s.message_count)}</p>
                            <p>{format!("Status: {}", s.status_message)}</p>
                        })}
                    </section>
                </Show>
            </aside>

            <main class="chat-main">
                <h1>"🤖 MCP Multi-Agent Chat"</h1>
                <p>"Chat with specialized agents: "<strong>"🧮 Calculator"</strong>" and "<strong>"🌤️ Weather"</strong></p>

                {move || {
                    let (class, message) = status();
                    view! { <div class=class>{message}</div> }
                }}

                {move || error.get().map(|e| view! { <div class="alert error">{e}</div> })}

                <div class="messages">
                    <For
                        each=move || {
                            session
                                .get()
                                .map(|s| s.history)
                                .unwrap_or_default()
                                .into_iter()
                                .enumerate()
                                .collect::<Vec<_>>()
                        }
                        key=|(idx, msg)| format!("{idx}-{}", msg.content.len())
                        children=move |(_, msg)| view! { <MessageBubble message=msg /> }
                    />
                    <Show when=move || loading.get()>
                        <div class="message loading">"🤔 thinking..."</div>
                    </Show>
                </div>

                <div class="input-area">
                    <textarea
                        placeholder="Ask me anything!"
                        prop:value=move || input.get()
                        on:input=move |ev| set_input.set(event_target_value(&ev))
                        on:keydown=move |ev| {
                            if ev.key() == "Enter" && !ev.shift_key() {
                                ev.prevent_default();
                                send(());
                            }
                        }
                    />
                    <button on:click=move |_| send(()) disabled=move || loading.get()>
                        {move || if loading.get() { "..." } else { "Send" }}
                    </button>
                </div>
            </main>
        </div>
    }
}
