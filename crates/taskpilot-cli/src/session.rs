use anyhow::Result;
use console::style;
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;

use taskpilot::agent::{Agent, AgentEvent};
use taskpilot::models::message::{Message, MessageContent};
use taskpilot::models::role::Role;

/// Interactive console session over a configured agent
pub struct Session {
    agent: Agent,
    messages: Vec<Message>,
}

impl Session {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            messages: Vec::new(),
        }
    }

    pub async fn start(mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        println!(
            "Task assistant {}",
            style("- type \"quit\" to end the session").dim()
        );

        loop {
            let line = match editor.readline("you> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            if matches!(input.to_lowercase().as_str(), "q" | "quit" | "exit") {
                break;
            }
            let _ = editor.add_history_entry(input);

            self.messages.push(Message::user().with_text(input));
            self.process_turn().await;
            println!();
        }
        Ok(())
    }

    async fn process_turn(&mut self) {
        let mut stream = match self.agent.reply(&self.messages).await {
            Ok(stream) => stream,
            Err(e) => {
                eprintln!("{}", style(format!("Error starting reply: {}", e)).red());
                return;
            }
        };

        loop {
            tokio::select! {
                response = stream.next() => {
                    match response {
                        Some(Ok(AgentEvent::TextDelta(text))) => {
                            print!("{}", text);
                            let _ = std::io::stdout().flush();
                        }
                        Some(Ok(AgentEvent::Message(message))) => {
                            render_tool_activity(&message);
                            self.messages.push(message);
                        }
                        Some(Err(e)) => {
                            eprintln!("\n{}", style(format!("Error: {}", e)).red());
                            break;
                        }
                        None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    drop(stream);
                    // Reset the interaction to before the interrupted request
                    while let Some(message) = self.messages.pop() {
                        if message.role == Role::User {
                            break;
                        }
                    }
                    println!(
                        "\n{}",
                        style("Interrupted: conversation reset to before the last message.").dim()
                    );
                    break;
                }
            }
        }
    }
}

fn render_tool_activity(message: &Message) {
    for content in &message.content {
        if let MessageContent::ToolRequest(request) = content {
            match &request.tool_call {
                Ok(call) => println!(
                    "\n{}",
                    style(format!("calling {} {}", call.name, call.arguments)).dim()
                ),
                Err(e) => println!("\n{}", style(format!("invalid tool call: {}", e)).dim()),
            }
        }
    }
}
