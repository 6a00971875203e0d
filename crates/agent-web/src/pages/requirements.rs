//! Requirements Page

use leptos::prelude::*;

use crate::api;

#[derive(Clone, Debug, PartialEq)]
enum Outcome {
    Idle,
    Warning(&'static str),
    Result(String),
    Failed(String),
}

#[component]
pub fn RequirementsPage() -> impl IntoView {
    let (input, set_input) = signal(String::new());
    let (agent_type, set_agent_type) = signal(String::from("extract"));
    let (loading, set_loading) = signal(false);
    let (outcome, set_outcome) = signal(Outcome::Idle);

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if loading.get() {
            return;
        }

        let text = input.get();
        if text.trim().is_empty() {
            set_outcome.set(Outcome::Warning("Please enter some input."));
            return;
        }

        set_loading.set(true);
        let kind = agent_type.get();
        leptos::task::spawn_local(async move {
            let next = match api::run_requirements(&text, &kind).await {
                Ok(result) => Outcome::Result(result),
                Err(e) => Outcome::Failed(e),
            };
            set_outcome.set(next);
            set_loading.set(false);
        });
    };

    view! {
        <div class="requirements">
            <header>
                <h1>"Engineering Agent Platform"</h1>
                <p class="tagline">"Enter your engineering text and choose an agent."</p>
                <a href="/chat" class="btn">"Open Multi-Agent Chat"</a>
            </header>

            <form on:submit=submit>
                <label>"Engineering Text"</label>
                <textarea
                    rows="10"
                    prop:value=move || input.get()
                    on:input=move |ev| set_input.set(event_target_value(&ev))
                />

                <label>"Select Agent"</label>
                <select on:change=move |ev| set_agent_type.set(event_target_value(&ev))>
                    <option value="extract" selected=move || agent_type.get() == "extract">"extract"</option>
                    <option value="validate" selected=move || agent_type.get() == "validate">"validate"</option>
                </select>

                <button type="submit" class="btn btn-primary" disabled=move || loading.get()>
                    {move || if loading.get() { "Running..." } else { "Run Agent" }}
                </button>
            </form>

            {move || match outcome.get() {
                Outcome::Idle => ().into_any(),
                Outcome::Warning(msg) => view! { <div class="alert warning">{msg}</div> }.into_any(),
                Outcome::Result(result) => view! {
                    <div class="alert success">"Result:"</div>
                    <pre class="result"><code>{result}</code></pre>
                }
                .into_any(),
                Outcome::Failed(err) => view! { <div class="alert error">{err}</div> }.into_any(),
            }}
        </div>
    }
}
