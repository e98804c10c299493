use crate::types::TranscriptSegment;

/// Video with a bundled transcript, used for demos without network access.
pub const TODO_LIST_VIDEO_ID: &str = "9wiWzu_tRB0";

const LINE_SECONDS: f64 = 5.0;

const TODO_LIST: [&str; 25] = [
    "Welcome everyone, today we're going to build a simple todo list application in React.",
    "This is a great beginner project to understand React fundamentals.",
    "Let me create a new components folder to organize our code.",
    "I'll create a new file called TodoList.jsx inside the components folder.",
    "Now let's start by creating a functional component. I'll type function TodoList.",
    "And we need to export this component so we can use it in other files.",
    "I'll add export default at the beginning. This makes it the default export from this file.",
    "Inside the function, we'll return some JSX. Let me add a return statement.",
    "For now, let's just return a div with an h1 that says Todo List.",
    "Now we need to make this interactive. React components need state to handle changing data.",
    "Let me import useState from React at the top of the file.",
    "useState is a React Hook that lets us add state to functional components.",
    "Now I'll create a state variable for our todos. const todos, setTodos equals useState.",
    "We'll initialize it with an empty array since we don't have any todos yet.",
    "We also need state for the input field. Let me create another state variable.",
    "const inputValue, setInputValue equals useState with an empty string.",
    "Now let's add an input field to our JSX so users can type new todos.",
    "I'll add an input element with type text.",
    "This input needs to be controlled, so I'll set its value to inputValue.",
    "And we need an onChange handler to update the state when the user types.",
    "onChange equals an arrow function that takes the event parameter.",
    "Inside, we'll call setInputValue with e.target.value.",
    "Now let's add a button to add new todos. I'll create an Add button.",
    "We need a function to handle adding todos. Let me create handleAddTodo.",
    "This function will update our todos state by creating a new array with the new todo.",
];

const DEFAULT: [&str; 5] = [
    "This is a sample transcript for demonstration purposes.",
    "When properly configured, real transcripts will be fetched from YouTube.",
    "The application analyzes the transcript to provide coding explanations.",
    "Each moment is explained to help beginners understand the code.",
    "Try using the React todo list tutorial video for the best experience.",
];

/// Bundled transcript for `video_id`, or a generic one. Lines are five seconds apart.
pub fn sample_transcript(video_id: &str) -> Vec<TranscriptSegment> {
    let lines: &[&str] = if video_id == TODO_LIST_VIDEO_ID {
        &TODO_LIST
    } else {
        &DEFAULT
    };

    lines
        .iter()
        .enumerate()
        .map(|(i, text)| TranscriptSegment::timed(i as f64 * LINE_SECONDS, LINE_SECONDS, *text))
        .collect()
}
